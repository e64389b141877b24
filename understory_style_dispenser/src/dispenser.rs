// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared style list, its dispatch history, and the live-cursor registry.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::change::StylesChange;
use crate::cursor::{Cursor, StylePredicate};
use crate::enumerator::{EnumeratorId, StyleEnumerator};
use crate::error::DispenserError;
use crate::history::{DispatchHistory, StyleDispensed};

pub(crate) type SharedState<S> = Rc<RefCell<DispenserState<S>>>;
pub(crate) type WeakState<S> = Weak<RefCell<DispenserState<S>>>;

/// Everything a dispenser owns. Enumerator handles reach it through a
/// [`WeakState`].
pub(crate) struct DispenserState<S> {
    styles: Option<Vec<S>>,
    parent: Option<WeakStyleDispenser<S>>,
    history: DispatchHistory<S>,
    pub(crate) cursors: HashMap<EnumeratorId, Cursor<S>>,
    next_id: u64,
}

impl<S> DispenserState<S> {
    fn new() -> Self {
        Self {
            styles: None,
            parent: None,
            history: DispatchHistory::new(),
            cursors: HashMap::new(),
            next_id: 0,
        }
    }

    pub(crate) fn styles(&self) -> &[S] {
        self.styles.as_deref().unwrap_or(&[])
    }

    pub(crate) fn has_local_styles(&self) -> bool {
        !self.styles().is_empty()
    }

    pub(crate) fn parent(&self) -> Option<StyleDispenser<S>> {
        self.parent.as_ref().and_then(WeakStyleDispenser::upgrade)
    }

    fn allocate_id(&mut self) -> EnumeratorId {
        let id = EnumeratorId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Registers a cursor after replaying the history into it.
    ///
    /// Replay goes straight to [`Cursor::observe`], so nothing is recorded or
    /// broadcast while the new cursor catches up.
    fn register(&mut self, predicate: StylePredicate<S>) -> EnumeratorId {
        let id = self.allocate_id();
        let mut cursor = Cursor::new(predicate);
        let styles = self.styles.as_deref().unwrap_or(&[]);
        for event in self.history.iter() {
            cursor.observe(event, styles);
        }
        self.cursors.insert(id, cursor);
        debug!(
            ?id,
            replayed = self.history.len(),
            live = self.cursors.len(),
            "registered style enumerator"
        );
        id
    }

    /// Removes a cursor. The caller drops the result once the dispenser is no
    /// longer borrowed, since it may own a parent enumerator.
    pub(crate) fn unregister(&mut self, id: EnumeratorId) -> Option<Cursor<S>> {
        let removed = self.cursors.remove(&id);
        if removed.is_some() {
            debug!(?id, live = self.cursors.len(), "disposed style enumerator");
        }
        removed
    }

    /// Clears the history and rewinds every cursor to the top of the list.
    ///
    /// While the dispenser delegates to a live parent, the positions that
    /// matter live in the parent: cursors only drop their local scan start and
    /// stay `Active`. Without a parent an empty list delegates to nothing, so
    /// cursors rewind fully.
    fn reset(&mut self) {
        let has_live_parent = self
            .parent
            .as_ref()
            .is_some_and(|parent| parent.inner.strong_count() > 0);
        let delegating = !self.has_local_styles() && has_live_parent;
        debug!(
            forgotten = self.history.len(),
            live = self.cursors.len(),
            delegating,
            "resetting style dispenser"
        );
        self.history.clear();
        for cursor in self.cursors.values_mut() {
            if delegating {
                cursor.rewind_position();
            } else {
                cursor.rewind();
            }
        }
    }

    fn styles_changed(&mut self, change: StylesChange) {
        if change.is_tail_append(self.styles().len()) {
            trace!(?change, "styles appended, keeping positions");
            return;
        }
        debug!(?change, "style list edited");
        self.reset();
    }
}

impl<S: Clone> DispenserState<S> {
    /// The slot the cursor `id` would claim next, with its style.
    pub(crate) fn next_claim(&self, id: EnumeratorId) -> Option<(usize, S)> {
        let cursor = self.cursors.get(&id)?;
        let styles = self.styles();
        let index = cursor.peek(styles)?;
        Some((index, styles[index].clone()))
    }

    /// Records a claim made by `source` and lets every live cursor react to it.
    ///
    /// The source is notified too, which is how it steps past the slot it
    /// just claimed.
    pub(crate) fn dispense(&mut self, source: EnumeratorId, event: StyleDispensed<S>) {
        if let Some(cursor) = self.cursors.get_mut(&source) {
            cursor.claim(event.index);
        }
        trace!(?source, index = event.index, "style dispensed");
        self.history.record(event);

        let Self {
            styles,
            history,
            cursors,
            ..
        } = self;
        let styles = styles.as_deref().unwrap_or(&[]);
        let Some(event) = history.latest() else {
            return;
        };
        for (id, cursor) in cursors.iter_mut() {
            if cursor.observe(event, styles) && *id != source {
                trace!(?id, index = event.index, "skipped slot claimed by a peer");
            }
        }
    }
}

/// A palette of styles handed out in rotation to cooperating enumerators.
///
/// The dispenser owns an ordered list of opaque style values. Consumers ask
/// for [`styles_where`](Self::styles_where) and receive a
/// [`StyleEnumerator`] that cycles through the styles accepted by a
/// predicate. Every claim is recorded and broadcast to the other live
/// enumerators, so two enumerators with overlapping predicates avoid handing
/// out the same style at the same time whenever the palette allows it.
///
/// `StyleDispenser` is a handle: cloning it is cheap and the clone refers to
/// the same dispenser. Handles are neither `Send` nor `Sync`. All coordination
/// relies on each call running to completion before the next one starts.
///
/// Predicates are called while the dispenser is borrowed and must not call
/// back into the same dispenser.
pub struct StyleDispenser<S> {
    inner: SharedState<S>,
}

impl<S> Clone for StyleDispenser<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> Default for StyleDispenser<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for StyleDispenser<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("StyleDispenser");
        if let Ok(state) = self.inner.try_borrow() {
            s.field("styles", &state.styles().len())
                .field("dispensed", &state.history.len())
                .field("live_enumerators", &state.cursors.len())
                .field("has_parent", &state.parent.is_some());
        }
        s.finish_non_exhaustive()
    }
}

impl<S> StyleDispenser<S> {
    /// Creates a dispenser with no styles and no parent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(DispenserState::new())),
        }
    }

    /// Returns a non-owning handle to this dispenser.
    #[must_use]
    pub fn downgrade(&self) -> WeakStyleDispenser<S> {
        WeakStyleDispenser {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if both handles refer to the same dispenser.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of styles in the local list. Zero when no list is set.
    #[must_use]
    pub fn style_count(&self) -> usize {
        self.inner.borrow().styles().len()
    }

    /// Returns `true` if the dispenser rotates through its own styles rather
    /// than delegating to its parent.
    #[must_use]
    pub fn has_local_styles(&self) -> bool {
        self.inner.borrow().has_local_styles()
    }

    /// The dispenser this one delegates to while it has no styles, if it is
    /// still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner.borrow().parent()
    }

    /// Sets or clears the parent dispenser.
    ///
    /// The dispenser keeps only a weak reference; the caller keeps the parent
    /// alive. Live enumerators drop the enumerators they obtained from the
    /// previous parent and lazily request new ones. The local history is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DispenserError::ParentCycle`] if `parent` is this dispenser
    /// or already delegates to it.
    pub fn set_parent(&self, parent: Option<&Self>) -> Result<(), DispenserError> {
        let unchanged = {
            let state = self.inner.borrow();
            match (&state.parent, parent) {
                (None, None) => true,
                (Some(current), Some(new)) => {
                    Weak::as_ptr(&current.inner) == Rc::as_ptr(&new.inner)
                }
                _ => false,
            }
        };
        if unchanged {
            return Ok(());
        }
        if let Some(new) = parent
            && new.delegates_to(self)
        {
            return Err(DispenserError::ParentCycle);
        }

        let stale: Vec<StyleEnumerator<S>> = {
            let mut state = self.inner.borrow_mut();
            state.parent = parent.map(Self::downgrade);
            state
                .cursors
                .values_mut()
                .filter_map(Cursor::forget_upstream)
                .collect()
        };
        debug!(
            has_parent = parent.is_some(),
            dropped_upstream = stale.len(),
            "style dispenser parent changed"
        );
        drop(stale);
        Ok(())
    }

    /// Number of enumerators that are registered and not yet disposed.
    #[must_use]
    pub fn live_enumerators(&self) -> usize {
        self.inner.borrow().cursors.len()
    }

    /// Forgets every claim and sends all live enumerators back to the first
    /// style.
    ///
    /// Enumerators that currently delegate to a live parent keep their
    /// upstream position.
    pub fn reset_styles(&self) {
        self.inner.borrow_mut().reset();
    }

    /// Returns `true` if `target` is this dispenser or one of its ancestors.
    fn delegates_to(&self, target: &Self) -> bool {
        let mut next = Some(self.clone());
        while let Some(dispenser) = next {
            if dispenser.ptr_eq(target) {
                return true;
            }
            next = dispenser.parent();
        }
        false
    }

    pub(crate) fn register(&self, predicate: StylePredicate<S>) -> StyleEnumerator<S> {
        let id = self.inner.borrow_mut().register(predicate);
        StyleEnumerator::new(Rc::downgrade(&self.inner), id)
    }
}

impl<S> StyleDispenser<S>
where
    S: Clone + PartialEq,
{
    /// Returns a copy of the style list, or `None` if no list is set.
    #[must_use]
    pub fn styles(&self) -> Option<Vec<S>> {
        self.inner.borrow().styles.clone()
    }

    /// Replaces the style list and resets every enumerator.
    ///
    /// Passing a list equal to the current one is a no-op: positions and
    /// history are kept, even when the list was built afresh. Call
    /// [`reset_styles`](Self::reset_styles) to restart the rotation without
    /// changing the list. `None` and an empty list both make enumerators
    /// delegate to the parent.
    pub fn set_styles(&self, styles: Option<Vec<S>>) {
        let mut state = self.inner.borrow_mut();
        if state.styles == styles {
            return;
        }
        state.styles = styles;
        state.reset();
    }

    /// Appends a style. Existing enumerator positions stay valid.
    pub fn push_style(&self, style: S) {
        self.extend_styles(core::iter::once(style));
    }

    /// Appends styles at the tail. Existing enumerator positions stay valid.
    pub fn extend_styles<I>(&self, styles: I)
    where
        I: IntoIterator<Item = S>,
    {
        let mut state = self.inner.borrow_mut();
        let list = state.styles.get_or_insert_with(Vec::new);
        let start = list.len();
        list.extend(styles);
        let count = list.len() - start;
        if count > 0 {
            state.styles_changed(StylesChange::Added { start, count });
        }
    }

    /// Inserts a style at `index`.
    ///
    /// Inserting at the end behaves like [`push_style`](Self::push_style).
    /// Inserting anywhere else shifts positions and resets every enumerator.
    ///
    /// # Errors
    ///
    /// Returns [`DispenserError::IndexOutOfBounds`] if `index` is greater than
    /// the number of styles.
    pub fn insert_style(&self, index: usize, style: S) -> Result<(), DispenserError> {
        let mut state = self.inner.borrow_mut();
        let len = state.styles().len();
        if index > len {
            return Err(DispenserError::IndexOutOfBounds { index, len });
        }
        state
            .styles
            .get_or_insert_with(Vec::new)
            .insert(index, style);
        state.styles_changed(StylesChange::Added {
            start: index,
            count: 1,
        });
        Ok(())
    }

    /// Removes and returns the style at `index`, resetting every enumerator.
    ///
    /// # Errors
    ///
    /// Returns [`DispenserError::IndexOutOfBounds`] if there is no style at
    /// `index`.
    pub fn remove_style(&self, index: usize) -> Result<S, DispenserError> {
        let mut state = self.inner.borrow_mut();
        let len = state.styles().len();
        let Some(list) = state.styles.as_mut().filter(|list| index < list.len()) else {
            return Err(DispenserError::IndexOutOfBounds { index, len });
        };
        let removed = list.remove(index);
        state.styles_changed(StylesChange::Removed { index });
        Ok(removed)
    }

    /// Replaces the style at `index`, returning the old value. Resets every
    /// enumerator.
    ///
    /// # Errors
    ///
    /// Returns [`DispenserError::IndexOutOfBounds`] if there is no style at
    /// `index`.
    pub fn replace_style(&self, index: usize, style: S) -> Result<S, DispenserError> {
        let mut state = self.inner.borrow_mut();
        let len = state.styles().len();
        let Some(slot) = state.styles.as_mut().and_then(|list| list.get_mut(index)) else {
            return Err(DispenserError::IndexOutOfBounds { index, len });
        };
        let previous = core::mem::replace(slot, style);
        state.styles_changed(StylesChange::Replaced { index });
        Ok(previous)
    }

    /// Moves the style at `from` so it ends up at `to`, resetting every
    /// enumerator. Moving a style onto itself changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DispenserError::IndexOutOfBounds`] if either index has no
    /// style.
    pub fn move_style(&self, from: usize, to: usize) -> Result<(), DispenserError> {
        let mut state = self.inner.borrow_mut();
        let len = state.styles().len();
        let Some(list) = state.styles.as_mut() else {
            return Err(DispenserError::IndexOutOfBounds { index: from, len });
        };
        for index in [from, to] {
            if index >= len {
                return Err(DispenserError::IndexOutOfBounds { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let style = list.remove(from);
        list.insert(to, style);
        state.styles_changed(StylesChange::Moved { from, to });
        Ok(())
    }

    /// Removes every style, resetting every enumerator. The dispenser then
    /// delegates to its parent.
    pub fn clear_styles(&self) {
        let mut state = self.inner.borrow_mut();
        let Some(list) = state.styles.as_mut() else {
            return;
        };
        if list.is_empty() {
            return;
        }
        list.clear();
        state.styles_changed(StylesChange::Cleared);
    }

    /// Returns an enumerator over the styles accepted by `predicate`.
    ///
    /// The enumerator starts where the dispatch history says the next
    /// unclaimed suitable style is, not blindly at the first one. It rotates
    /// indefinitely while at least one style matches and is exhausted as soon
    /// as none does.
    pub fn styles_where<F>(&self, predicate: F) -> StyleEnumerator<S>
    where
        F: Fn(&S) -> bool + 'static,
    {
        self.register(Rc::new(predicate))
    }

    /// Claims the next style accepted by `predicate` without keeping an
    /// enumerator around.
    ///
    /// The claim stays in the dispatch history, so the next call (or any
    /// other enumerator) moves on to a different style.
    pub fn take_next_where<F>(&self, predicate: F) -> Option<S>
    where
        F: Fn(&S) -> bool + 'static,
    {
        self.styles_where(predicate).next()
    }

    /// The claims currently on record, least recently claimed first.
    #[must_use]
    pub fn history(&self) -> Vec<StyleDispensed<S>> {
        self.inner.borrow().history.to_vec()
    }
}

/// A non-owning handle to a [`StyleDispenser`].
pub struct WeakStyleDispenser<S> {
    inner: WeakState<S>,
}

impl<S> WeakStyleDispenser<S> {
    /// Returns a strong handle if the dispenser is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<StyleDispenser<S>> {
        self.inner.upgrade().map(|inner| StyleDispenser { inner })
    }
}

impl<S> Clone for WeakStyleDispenser<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for WeakStyleDispenser<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStyleDispenser")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Builder for a [`StyleDispenser`] with its styles and parent set up front.
///
/// ```rust
/// use understory_style_dispenser::StyleDispenserBuilder;
///
/// let chart = StyleDispenserBuilder::new().styles(["red", "green"]).build();
/// let series = StyleDispenserBuilder::new().parent(&chart).build();
///
/// assert!(!series.has_local_styles());
/// assert_eq!(series.take_next_where(|_| true), Some("red"));
/// ```
#[derive(Debug)]
pub struct StyleDispenserBuilder<S> {
    styles: Option<Vec<S>>,
    parent: Option<WeakStyleDispenser<S>>,
}

impl<S> Default for StyleDispenserBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StyleDispenserBuilder<S> {
    /// Creates a builder with no styles and no parent.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            styles: None,
            parent: None,
        }
    }

    /// Sets the style list.
    #[must_use]
    pub fn styles<I>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        self.styles = Some(styles.into_iter().collect());
        self
    }

    /// Sets the parent dispenser used while the style list is empty.
    #[must_use]
    pub fn parent(mut self, parent: &StyleDispenser<S>) -> Self {
        self.parent = Some(parent.downgrade());
        self
    }

    /// Builds the dispenser.
    ///
    /// A fresh dispenser has no enumerators, so the parent cannot close a
    /// cycle and no reset is needed.
    #[must_use]
    pub fn build(self) -> StyleDispenser<S> {
        let dispenser = StyleDispenser::new();
        {
            let mut state = dispenser.inner.borrow_mut();
            state.styles = self.styles;
            state.parent = self.parent;
        }
        dispenser
    }
}
