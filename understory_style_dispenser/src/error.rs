// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by dispensers and enumerators.

/// Errors returned by [`StyleDispenser`](crate::StyleDispenser) and
/// [`StyleEnumerator`](crate::StyleEnumerator) operations.
///
/// Running out of styles is not an error: an exhausted enumerator simply
/// returns `false` from [`move_next`](crate::StyleEnumerator::move_next).
/// An empty or missing style list is not an error either.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispenserError {
    /// [`StyleEnumerator::reset`](crate::StyleEnumerator::reset) was called.
    ///
    /// Rewinding a single enumerator would let it replay styles that other
    /// enumerators currently hold. Request a new enumerator with
    /// [`StyleDispenser::styles_where`](crate::StyleDispenser::styles_where),
    /// or reset every enumerator at once with
    /// [`StyleDispenser::reset_styles`](crate::StyleDispenser::reset_styles).
    #[error(
        "a style enumerator cannot be reset; reset the style dispenser or request a new enumerator instead"
    )]
    ResetUnsupported,
    /// A positional edit of the style list referenced a missing slot.
    #[error("style index {index} is out of bounds for a list of {len} styles")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The length of the style list at the time of the call.
        len: usize,
    },
    /// The requested parent already delegates (directly or transitively) to
    /// this dispenser.
    #[error("a style dispenser cannot become its own ancestor")]
    ParentCycle,
}

#[cfg(test)]
mod tests {
    use super::DispenserError;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_offending_slot() {
        let err = DispenserError::IndexOutOfBounds { index: 4, len: 3 };
        assert_eq!(
            err.to_string(),
            "style index 4 is out of bounds for a list of 3 styles"
        );
    }
}
