// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch history: which palette slots were claimed, stalest first.

use alloc::vec::Vec;

/// A single dispense event: the style at `index` was handed out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleDispensed<S> {
    /// Position of the style in the dispenser's list at the time of the claim.
    pub index: usize,
    /// The style that was handed out.
    pub style: S,
}

impl<S> StyleDispensed<S> {
    /// Creates a dispense event for `style` at `index`.
    #[must_use]
    pub const fn new(index: usize, style: S) -> Self {
        Self { index, style }
    }
}

/// Ordered record of claimed slots, with the least recently claimed first.
///
/// Each index appears at most once. Claiming a slot again moves its entry to
/// the back, so iteration order reflects staleness.
#[derive(Clone, Debug)]
pub(crate) struct DispatchHistory<S> {
    events: Vec<StyleDispensed<S>>,
}

impl<S> DispatchHistory<S> {
    pub(crate) const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Records `event` as the most recent claim, dropping any older claim of
    /// the same slot.
    pub(crate) fn record(&mut self, event: StyleDispensed<S>) {
        if let Some(pos) = self.events.iter().position(|e| e.index == event.index) {
            self.events.remove(pos);
        }
        self.events.push(event);
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, StyleDispensed<S>> {
        self.events.iter()
    }

    pub(crate) fn latest(&self) -> Option<&StyleDispensed<S>> {
        self.events.last()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }
}

impl<S: Clone> DispatchHistory<S> {
    pub(crate) fn to_vec(&self) -> Vec<StyleDispensed<S>> {
        self.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{DispatchHistory, StyleDispensed};
    use alloc::vec::Vec;

    fn indices(history: &DispatchHistory<char>) -> Vec<usize> {
        history.iter().map(|e| e.index).collect()
    }

    #[test]
    fn reclaiming_a_slot_moves_it_to_the_back() {
        let mut history = DispatchHistory::new();
        history.record(StyleDispensed::new(0, 'a'));
        history.record(StyleDispensed::new(1, 'b'));
        history.record(StyleDispensed::new(2, 'c'));
        history.record(StyleDispensed::new(0, 'a'));

        assert_eq!(indices(&history), [1, 2, 0]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest(), Some(&StyleDispensed::new(0, 'a')));
    }

    #[test]
    fn slots_are_matched_by_index_not_style() {
        let mut history = DispatchHistory::new();
        history.record(StyleDispensed::new(0, 'a'));
        // Same slot, different style (the list was edited in place).
        history.record(StyleDispensed::new(0, 'z'));

        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|e| e.style), Some('z'));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut history = DispatchHistory::new();
        history.record(StyleDispensed::new(3, 'd'));
        history.clear();
        assert_eq!(history.len(), 0);
        assert_eq!(history.latest(), None);
    }
}
