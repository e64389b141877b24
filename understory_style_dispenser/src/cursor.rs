// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-enumerator position state, owned by the dispenser's registry.

use alloc::rc::Rc;

use crate::enumerator::StyleEnumerator;
use crate::history::StyleDispensed;

/// Filter deciding which styles an enumerator may hand out.
pub(crate) type StylePredicate<S> = Rc<dyn Fn(&S) -> bool>;

/// Returns the first index at or after `start` whose style satisfies
/// `predicate`, wrapping around the end of `styles` at most once.
///
/// A `start` past the end of the list restarts at 0.
pub(crate) fn next_suitable_index<S>(
    styles: &[S],
    start: usize,
    predicate: &dyn Fn(&S) -> bool,
) -> Option<usize> {
    let len = styles.len();
    if len == 0 {
        return None;
    }
    let start = if start >= len { 0 } else { start };
    (0..len)
        .map(|offset| (start + offset) % len)
        .find(|&index| predicate(&styles[index]))
}

/// Where one enumerator stands in the rotation.
///
/// The consumer holds the [`StyleEnumerator`] handle; the dispenser holds this
/// record so it can adjust every position when a style is claimed or the list
/// is reset.
pub(crate) struct Cursor<S> {
    pub(crate) predicate: StylePredicate<S>,
    /// Where the next scan starts. `None` means "from the top".
    pub(crate) index: Option<usize>,
    /// Set once the enumerator has produced a style since creation or the
    /// last rewind.
    pub(crate) produced: bool,
    /// Lazily created enumerator on the parent dispenser, used while the owning
    /// dispenser has no styles of its own.
    pub(crate) upstream: Option<StyleEnumerator<S>>,
}

impl<S> Cursor<S> {
    pub(crate) fn new(predicate: StylePredicate<S>) -> Self {
        Self {
            predicate,
            index: None,
            produced: false,
            upstream: None,
        }
    }

    /// Index this cursor would claim next.
    pub(crate) fn peek(&self, styles: &[S]) -> Option<usize> {
        next_suitable_index(styles, self.index.unwrap_or(0), &*self.predicate)
    }

    /// Applies a claim made anywhere in the dispenser, including by this cursor.
    ///
    /// If the claimed slot is the one this cursor would have produced next,
    /// the cursor steps past it. Returns `true` when the cursor moved.
    pub(crate) fn observe(&mut self, event: &StyleDispensed<S>, styles: &[S]) -> bool {
        if styles.is_empty() || !(*self.predicate)(&event.style) {
            return false;
        }
        if self.peek(styles) != Some(event.index) {
            return false;
        }
        self.index = Some((event.index + 1) % styles.len());
        true
    }

    pub(crate) fn claim(&mut self, index: usize) {
        self.index = Some(index);
        self.produced = true;
    }

    pub(crate) fn rewind(&mut self) {
        self.rewind_position();
        self.produced = false;
    }

    /// Forgets the local scan start but keeps the lifecycle flag, for cursors
    /// currently fed by a parent enumerator.
    pub(crate) fn rewind_position(&mut self) {
        self.index = None;
    }

    /// Detaches the cached parent enumerator so the caller can drop it outside
    /// any borrow of the dispenser.
    pub(crate) fn forget_upstream(&mut self) -> Option<StyleEnumerator<S>> {
        self.upstream.take()
    }
}
