//! Property-based tests for the scheduler and the state hierarchy.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::{DateTime, TimeZone, Utc};
use hierarch::builder::{MachineBuilder, StateGraphBuilder};
use hierarch::core::{NamedEvent, StateGraph, StateId};
use hierarch::schedule::TimerQueue;
use proptest::prelude::*;
use std::time::Duration;

fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

#[derive(Clone, Debug)]
enum Op {
    At(i64, u8),
    After(u64, u8),
    Every(u64, u8),
    Cancel(u8),
    Pop(i64),
}

fn event(tag: u8) -> NamedEvent {
    NamedEvent::new(format!("e{tag}"))
}

prop_compose! {
    fn arbitrary_op()(kind in 0..5u8, offset in 0..500i64, span in 0..120u64, tag in 0..4u8) -> Op {
        match kind {
            0 => Op::At(offset, tag),
            1 => Op::After(span, tag),
            2 => Op::Every(span, tag),
            3 => Op::Cancel(tag),
            _ => Op::Pop(offset),
        }
    }
}

/// Parent indices for a random forest: each state may hang under any
/// earlier state.
fn arbitrary_forest() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1..12usize).prop_flat_map(|len| {
        (0..len)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop_oneof![Just(None), (0..i).prop_map(Some)].boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn forest(parents: &[Option<usize>]) -> StateGraph<(), NamedEvent> {
    let mut builder = StateGraphBuilder::<(), NamedEvent>::new();
    let mut ids: Vec<StateId> = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        let id = builder
            .define(format!("S{i}"), parent.map(|p| ids[p]))
            .unwrap();
        ids.push(id);
    }
    builder.build()
}

proptest! {
    #[test]
    fn next_wake_is_always_the_minimum_due_time(
        ops in prop::collection::vec(arbitrary_op(), 0..60)
    ) {
        let mut timers = TimerQueue::new(t0());

        for op in ops {
            match op {
                Op::At(offset, tag) => timers.at(t0() + chrono::Duration::seconds(offset), event(tag)),
                Op::After(secs, tag) => timers.after(Duration::from_secs(secs), event(tag)),
                Op::Every(secs, tag) => timers.every(Duration::from_secs(secs), event(tag)),
                Op::Cancel(tag) => {
                    timers.cancel(&event(tag));
                }
                Op::Pop(offset) => {
                    timers.pop_due(t0() + chrono::Duration::seconds(offset));
                }
            }

            let expected = timers.entries().iter().map(|entry| entry.due).min();
            prop_assert_eq!(timers.next_wake(), expected);
        }
    }

    #[test]
    fn cancelled_event_never_fires(
        ops in prop::collection::vec(arbitrary_op(), 0..40),
        victim in 0..4u8
    ) {
        let mut timers = TimerQueue::new(t0());
        for op in ops {
            match op {
                Op::At(offset, tag) => timers.at(t0() + chrono::Duration::seconds(offset), event(tag)),
                Op::After(secs, tag) | Op::Every(secs, tag) => {
                    timers.after(Duration::from_secs(secs), event(tag))
                }
                _ => {}
            }
        }

        timers.cancel(&event(victim));
        let far = t0() + chrono::Duration::days(1);
        while let Some(fired) = timers.pop_due(far) {
            prop_assert_ne!(fired, event(victim));
        }
    }

    #[test]
    fn recurring_entry_fires_once_per_elapsed_period(
        interval in 1..600u64,
        periods in 0..20u32,
        fraction in 0..100u32
    ) {
        let mut timers = TimerQueue::new(t0());
        timers.every(Duration::from_secs(interval), event(0));

        let first = t0() + chrono::Duration::seconds(interval as i64);
        let elapsed = interval as i64 * periods as i64 + interval as i64 * fraction as i64 / 100;
        let now = first + chrono::Duration::seconds(elapsed);

        let mut fired = 0;
        while timers.pop_due(now).is_some() {
            fired += 1;
        }

        let expected = elapsed / interval as i64 + 1;
        prop_assert_eq!(fired, expected);
        prop_assert_eq!(
            timers.next_wake(),
            Some(first + chrono::Duration::seconds(interval as i64 * expected))
        );
    }

    #[test]
    fn advance_never_exceeds_cap(cap in 0..20usize, due in 0..50usize) {
        let mut builder = StateGraphBuilder::<(), NamedEvent>::new();
        let only = builder.define_root("Only").unwrap();
        let mut machine = MachineBuilder::new(builder.build_shared())
            .initial(only)
            .clock(t0())
            .build()
            .unwrap();
        for _ in 0..due {
            machine.at(t0(), event(1));
        }

        let advance = machine.advance(t0(), cap).unwrap();

        prop_assert_eq!(advance.fired, cap.min(due));
        prop_assert_eq!(advance.backlog, due > cap);
    }

    #[test]
    fn lookup_by_name_is_identity(parents in arbitrary_forest()) {
        let graph = forest(&parents);

        for id in graph.states() {
            let rebuilt = graph.lookup(graph.name(id)).unwrap();
            prop_assert_eq!(rebuilt, id);
        }
    }

    #[test]
    fn is_matches_ancestry(parents in arbitrary_forest()) {
        let graph = forest(&parents);

        for a in graph.states() {
            let chain: Vec<StateId> = graph.ancestry(a).collect();
            prop_assert_eq!(chain.len(), graph.depth(a) + 1);
            for b in graph.states() {
                prop_assert_eq!(graph.is(a, b), chain.contains(&b));
            }
        }
    }

    #[test]
    fn is_is_a_partial_order(parents in arbitrary_forest()) {
        let graph = forest(&parents);

        for a in graph.states() {
            prop_assert!(graph.is(a, a));
            for b in graph.states() {
                if a != b && graph.is(a, b) {
                    prop_assert!(!graph.is(b, a));
                }
            }
        }
    }
}
