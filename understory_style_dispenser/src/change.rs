// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental edits to a dispenser's style list.

/// Describes an in-place edit of a dispenser's style list.
///
/// Every positional edit made through [`StyleDispenser`](crate::StyleDispenser)
/// is reported as one of these values. An append at the tail keeps every
/// enumerator's position valid. Any other edit shifts or invalidates
/// positions, so the dispenser resets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StylesChange {
    /// `count` styles were inserted starting at `start`.
    Added {
        /// Index of the first inserted style.
        start: usize,
        /// Number of inserted styles.
        count: usize,
    },
    /// The style at `index` was removed.
    Removed {
        /// Index the style occupied before removal.
        index: usize,
    },
    /// The style at `index` was swapped for another value.
    Replaced {
        /// Index of the replaced style.
        index: usize,
    },
    /// A style moved from `from` to `to`.
    Moved {
        /// Previous index.
        from: usize,
        /// New index.
        to: usize,
    },
    /// Every style was removed.
    Cleared,
}

impl StylesChange {
    /// Returns `true` if this change only appended styles after the previous
    /// last element.
    ///
    /// `len_after` is the length of the list once the change has been applied.
    #[must_use]
    pub fn is_tail_append(&self, len_after: usize) -> bool {
        match *self {
            Self::Added { start, count } => len_after.checked_sub(count) == Some(start),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StylesChange;

    #[test]
    fn only_appends_at_the_old_tail_count() {
        // [a, b, c] + [d, e]
        assert!(StylesChange::Added { start: 3, count: 2 }.is_tail_append(5));
        // Insert into the middle.
        assert!(!StylesChange::Added { start: 1, count: 1 }.is_tail_append(4));
        // First items of an empty list.
        assert!(StylesChange::Added { start: 0, count: 2 }.is_tail_append(2));
    }

    #[test]
    fn structural_edits_are_never_appends() {
        assert!(!StylesChange::Removed { index: 2 }.is_tail_append(2));
        assert!(!StylesChange::Replaced { index: 0 }.is_tail_append(3));
        assert!(!StylesChange::Moved { from: 0, to: 2 }.is_tail_append(3));
        assert!(!StylesChange::Cleared.is_tail_append(0));
    }

    #[test]
    fn inconsistent_lengths_do_not_underflow() {
        assert!(!StylesChange::Added { start: 0, count: 5 }.is_tail_append(2));
    }
}
