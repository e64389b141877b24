// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Consumer-side handles that walk a dispenser's rotation.

use alloc::rc::Rc;
use core::fmt;

use crate::dispenser::{SharedState, WeakState};
use crate::error::DispenserError;
use crate::history::StyleDispensed;

/// Identifies an enumerator within its dispenser.
///
/// Ids are allocated in creation order and never reused by the same
/// dispenser.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumeratorId(u64);

impl EnumeratorId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Lifecycle of a [`StyleEnumerator`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnumeratorState {
    /// Has not produced a style since it was created or since the dispenser
    /// last reset.
    Fresh,
    /// Has produced at least one style.
    Active,
    /// Ran out of suitable styles or was disposed. Terminal.
    Exhausted,
}

/// A cursor over a [`StyleDispenser`](crate::StyleDispenser)'s styles,
/// filtered by a predicate.
///
/// Obtained from [`StyleDispenser::styles_where`](crate::StyleDispenser::styles_where).
/// Each successful [`move_next`](Self::move_next) claims a style and tells the
/// dispenser, which lets sibling enumerators step past that slot.
///
/// The enumerator rotates indefinitely while any style satisfies the
/// predicate. Once nothing does, it becomes exhausted and stays that way.
/// Dropping the handle (or calling [`dispose`](Self::dispose)) unregisters it.
///
/// When the dispenser has no styles of its own, the enumerator forwards to an
/// enumerator with the same predicate on the dispenser's parent.
pub struct StyleEnumerator<S> {
    dispenser: WeakState<S>,
    id: EnumeratorId,
    current: Option<S>,
    disposed: bool,
}

impl<S> fmt::Debug for StyleEnumerator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleEnumerator")
            .field("id", &self.id)
            .field("has_current", &self.current.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<S> StyleEnumerator<S> {
    pub(crate) fn new(dispenser: WeakState<S>, id: EnumeratorId) -> Self {
        Self {
            dispenser,
            id,
            current: None,
            disposed: false,
        }
    }

    /// This enumerator's id within its dispenser.
    #[must_use]
    pub fn id(&self) -> EnumeratorId {
        self.id
    }

    /// The style produced by the last successful [`move_next`](Self::move_next).
    ///
    /// `None` before the first call and after exhaustion.
    #[must_use]
    pub fn current(&self) -> Option<&S> {
        self.current.as_ref()
    }

    /// Where this enumerator is in its lifecycle.
    #[must_use]
    pub fn state(&self) -> EnumeratorState {
        if self.disposed {
            return EnumeratorState::Exhausted;
        }
        let Some(shared) = self.dispenser.upgrade() else {
            return EnumeratorState::Exhausted;
        };
        let produced = shared
            .borrow()
            .cursors
            .get(&self.id)
            .is_some_and(|cursor| cursor.produced);
        if produced {
            EnumeratorState::Active
        } else {
            EnumeratorState::Fresh
        }
    }

    /// Always fails.
    ///
    /// A single enumerator cannot rewind without replaying styles that other
    /// enumerators hold. Request a new enumerator, or call
    /// [`StyleDispenser::reset_styles`](crate::StyleDispenser::reset_styles)
    /// to restart all of them together.
    ///
    /// # Errors
    ///
    /// Always returns [`DispenserError::ResetUnsupported`].
    pub fn reset(&mut self) -> Result<(), DispenserError> {
        Err(DispenserError::ResetUnsupported)
    }

    /// Stops taking part in the rotation.
    ///
    /// Unregisters from the dispenser and releases any parent enumerator.
    /// Calling this more than once is harmless; it also runs on drop and on
    /// exhaustion.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let Some(shared) = self.dispenser.upgrade() else {
            return;
        };
        // Bound separately so the borrow ends before the cursor (and any
        // parent enumerator it owns) is dropped.
        let removed = shared.borrow_mut().unregister(self.id);
        drop(removed);
    }

    fn finish(&mut self) {
        self.current = None;
        self.dispose();
    }
}

impl<S> StyleEnumerator<S>
where
    S: Clone + PartialEq,
{
    /// Claims the next suitable style.
    ///
    /// Returns `true` and updates [`current`](Self::current) on success.
    /// Returns `false` once no style satisfies the predicate. The enumerator
    /// is then exhausted and every later call also returns `false`.
    pub fn move_next(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        let Some(shared) = self.dispenser.upgrade() else {
            self.finish();
            return false;
        };
        if let Some(advanced) = self.move_next_upstream(&shared) {
            return advanced;
        }

        let claim = shared.borrow().next_claim(self.id);
        let Some((index, style)) = claim else {
            self.finish();
            return false;
        };
        self.current = Some(style.clone());
        shared
            .borrow_mut()
            .dispense(self.id, StyleDispensed::new(index, style));
        true
    }

    /// Forwards to the parent dispenser while the local list is empty.
    ///
    /// Returns `None` when this enumerator should scan locally instead: the
    /// dispenser has styles, or has no live parent.
    fn move_next_upstream(&mut self, shared: &SharedState<S>) -> Option<bool> {
        let (parent, cached, predicate) = {
            let mut state = shared.borrow_mut();
            if state.has_local_styles() {
                return None;
            }
            let parent = state.parent()?;
            let cursor = state.cursors.get_mut(&self.id)?;
            (parent, cursor.upstream.take(), Rc::clone(&cursor.predicate))
        };

        let mut upstream = cached.unwrap_or_else(|| parent.register(predicate));
        let advanced = upstream.move_next();

        if advanced {
            self.current = upstream.current().cloned();
            if let Some(cursor) = shared.borrow_mut().cursors.get_mut(&self.id) {
                cursor.produced = true;
                cursor.upstream = Some(upstream);
            }
        } else {
            drop(upstream);
            self.finish();
        }
        Some(advanced)
    }
}

impl<S> Iterator for StyleEnumerator<S>
where
    S: Clone + PartialEq,
{
    type Item = S;

    fn next(&mut self) -> Option<S> {
        if self.move_next() {
            self.current.clone()
        } else {
            None
        }
    }
}

impl<S> Drop for StyleEnumerator<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
