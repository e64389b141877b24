// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests: random interleavings of enumerator creation, claims,
//! disposal and resets.

use proptest::prelude::*;
use understory_style_dispenser::{StyleDispenser, StyleEnumerator};

#[derive(Clone, Debug)]
enum Op {
    Create,
    Advance(usize),
    Dispose(usize),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Create),
        6 => any::<usize>().prop_map(Op::Advance),
        1 => any::<usize>().prop_map(Op::Dispose),
        1 => Just(Op::Reset),
    ]
}

/// A live enumerator plus the global claim number of its current style.
struct Consumer {
    enumerator: StyleEnumerator<usize>,
    claimed_at: Option<u64>,
}

proptest! {
    /// With a shared predicate, claims sweep the palette in order no matter
    /// which consumer makes them, and the last `len` claims never repeat a
    /// style.
    #[test]
    fn shared_predicate_rotates_without_duplicates(
        len in 1_usize..6,
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let dispenser = StyleDispenser::new();
        dispenser.set_styles(Some((0..len).collect()));

        let mut consumers: Vec<Consumer> = Vec::new();
        let mut expected = 0_usize;
        let mut claims = 0_u64;
        let mut epoch_start = 0_u64;

        for op in ops {
            match op {
                Op::Create => consumers.push(Consumer {
                    enumerator: dispenser.styles_where(|_| true),
                    claimed_at: None,
                }),
                Op::Advance(pick) if !consumers.is_empty() => {
                    let slot = pick % consumers.len();
                    let consumer = &mut consumers[slot];
                    prop_assert!(consumer.enumerator.move_next());
                    let style = *consumer.enumerator.current().unwrap();
                    prop_assert_eq!(style, expected);
                    expected = (expected + 1) % len;
                    claims += 1;
                    consumer.claimed_at = Some(claims);

                    let window = claims.saturating_sub(len as u64).max(epoch_start);
                    let mut recent: Vec<usize> = consumers
                        .iter()
                        .filter(|c| c.claimed_at.is_some_and(|at| at > window))
                        .filter_map(|c| c.enumerator.current().copied())
                        .collect();
                    let total = recent.len();
                    recent.sort_unstable();
                    recent.dedup();
                    prop_assert_eq!(recent.len(), total);
                }
                Op::Dispose(pick) if !consumers.is_empty() => {
                    let slot = pick % consumers.len();
                    consumers.swap_remove(slot);
                }
                Op::Reset => {
                    dispenser.reset_styles();
                    expected = 0;
                    epoch_start = claims;
                }
                _ => {}
            }
            prop_assert_eq!(dispenser.live_enumerators(), consumers.len());
        }
    }

    /// Enumerators with arbitrary predicates only hand out styles they accept,
    /// run dry exactly when they accept nothing, and leave a well-formed
    /// history behind.
    #[test]
    fn claims_respect_predicates_and_history_stays_well_formed(
        len in 0_usize..7,
        masks in prop::collection::vec(0_u8..128, 1..5),
        steps in prop::collection::vec(any::<usize>(), 0..60),
    ) {
        let dispenser = StyleDispenser::new();
        dispenser.set_styles(Some((0..len).collect::<Vec<usize>>()));

        let mut enumerators: Vec<(u8, StyleEnumerator<usize>)> = masks
            .iter()
            .map(|&mask| (mask, dispenser.styles_where(move |s: &usize| mask & (1 << *s) != 0)))
            .collect();

        for step in steps {
            let slot = step % enumerators.len();
            let (mask, enumerator) = &mut enumerators[slot];
            let accepts_any = (0..len).any(|s| *mask & (1 << s) != 0);

            // Static list: an enumerator either rotates forever or is dry from
            // the first call on.
            prop_assert_eq!(enumerator.move_next(), accepts_any);
            if let Some(style) = enumerator.current() {
                prop_assert!(*mask & (1 << *style) != 0);
            }

            let history = dispenser.history();
            let mut indices: Vec<usize> = history.iter().map(|e| e.index).collect();
            prop_assert!(indices.iter().all(|&i| i < len));
            for event in &history {
                prop_assert_eq!(event.style, event.index);
            }
            let total = indices.len();
            indices.sort_unstable();
            indices.dedup();
            prop_assert_eq!(indices.len(), total);
        }
    }
}
