//! Thermostat State Machine
//!
//! This example drives a small hierarchical machine through simulated time.
//!
//! Key concepts:
//! - Nested states (Heating and Idle inside Powered)
//! - Events inherited from a parent state
//! - Recurring and one-shot timers armed from entry actions
//! - An external driver polling `next_wake`
//! - Checkpoint and restore by state name
//!
//! Run with: cargo run --example thermostat
//! Set RUST_LOG=hierarch=debug to see each state change.

use chrono::{DateTime, TimeZone, Utc};
use hierarch::builder::{MachineBuilder, StateGraphBuilder};
use hierarch::checkpoint::Checkpoint;
use hierarch::machine::{MachineData, StateMachine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum Signal {
    Sample,
    TooCold,
    WarmEnough,
    PowerOff,
    PowerOn,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Room {
    temperature: f64,
    heater_minutes: u32,
}

impl MachineData for Room {}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Thermostat State Machine ===\n");

    let mut graph = StateGraphBuilder::<Room, Signal>::new();
    let powered = graph.define_root("Powered").unwrap();
    let idle = graph.define_child("Idle", powered).unwrap();
    let heating = graph.define_child("Heating", powered).unwrap();
    let off = graph.define_root("Off").unwrap();

    graph
        // Powered samples the room once a minute for as long as it is on.
        .on_entry(powered, |ctx| {
            ctx.every(Duration::from_secs(60), Signal::Sample)
        })
        .on_exit(powered, |ctx| {
            ctx.cancel(&Signal::Sample);
        })
        .on_event(idle, Signal::Sample, |ctx, current, _| {
            ctx.data_mut().temperature -= 0.5;
            if ctx.data().temperature < 19.0 {
                ctx.raise(Signal::TooCold);
            }
            current
        })
        .on_event(heating, Signal::Sample, |ctx, current, _| {
            let room = ctx.data_mut();
            room.temperature += 1.0;
            room.heater_minutes += 1;
            if room.temperature >= 21.0 {
                ctx.raise(Signal::WarmEnough);
            }
            current
        })
        .goto(idle, Signal::TooCold, heating)
        .goto(heating, Signal::WarmEnough, idle)
        .goto(powered, Signal::PowerOff, off)
        .goto(off, Signal::PowerOn, idle);

    let graph = graph.build_shared();
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    let mut machine = MachineBuilder::new(graph.clone())
        .initial(off)
        .data(Room {
            temperature: 20.0,
            heater_minutes: 0,
        })
        .clock(start)
        .build()
        .unwrap();

    println!(
        "Initial state: {}",
        machine.current_state_name().unwrap_or("-")
    );
    machine.raise(Signal::PowerOn).unwrap();
    println!(
        "After PowerOn: {}",
        machine.current_state_name().unwrap_or("-")
    );
    println!("Next wake: {:?}\n", machine.next_wake());

    // Vacation mode: switch off after two hours.
    machine.after(Duration::from_secs(2 * 60 * 60), Signal::PowerOff);

    println!("Driving simulated time:");
    let mut last = machine.current_state();
    while let Some(wake) = machine.next_wake() {
        machine.tick(wake).unwrap();
        if machine.current_state() != last {
            report(&machine, wake, start);
            last = machine.current_state();
        }
    }

    println!(
        "\nHeater ran for {} minutes; room at {:.1}C",
        machine.data().heater_minutes,
        machine.data().temperature
    );
    println!("Nothing left to wake for: {:?}\n", machine.next_wake());

    println!("Checkpoint and restore:");
    let json = machine.checkpoint().to_json().unwrap();
    println!("  {} bytes of JSON", json.len());
    let checkpoint = Checkpoint::<Room, Signal>::from_json(&json).unwrap();
    // Configuration is not stored in a checkpoint; pass it back in.
    let config = machine.config().clone();
    let mut restored = StateMachine::restore_with_config(graph, checkpoint, config)
        .unwrap();
    println!(
        "  Restored into: {}",
        restored.current_state_name().unwrap_or("-")
    );
    restored.raise(Signal::PowerOn).unwrap();
    println!(
        "  After PowerOn: {}",
        restored.current_state_name().unwrap_or("-")
    );
    println!("  Next wake: {:?}", restored.next_wake());

    println!("\n=== Example Complete ===");
}

fn report(machine: &StateMachine<Room, Signal>, at: DateTime<Utc>, start: DateTime<Utc>) {
    println!(
        "  t+{:>3}m  {:<8} {:.1}C",
        (at - start).num_minutes(),
        machine.current_state_name().unwrap_or("-"),
        machine.data().temperature
    );
}
