// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_style_dispenser --heading-base-level=0

//! Understory Style Dispenser: rotating style palettes shared by many consumers.
//!
//! Charts hand out visual styles to series and data points from a palette.
//! Several independent consumers draw from the same palette, and each one
//! comes and goes at its own pace. They should still end up with different
//! styles whenever the palette is large enough. This crate keeps that
//! bookkeeping in one place.
//!
//! - [`StyleDispenser`] owns the ordered palette, an optional parent
//!   dispenser, and the dispatch history of which slots were claimed most
//!   recently.
//! - [`StyleEnumerator`] is a cursor over the palette, filtered by a
//!   predicate. Each claim it makes is broadcast to its siblings, and a
//!   sibling that was about to land on the same slot steps past it.
//!
//! Style values are opaque: the dispenser only clones and compares them.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_style_dispenser::StyleDispenser;
//!
//! let palette = StyleDispenser::new();
//! palette.set_styles(Some(vec!["A", "B", "C"]));
//!
//! let mut first = palette.styles_where(|_| true);
//! assert!(first.move_next());
//! assert_eq!(first.current(), Some(&"A"));
//!
//! // A second consumer does not start on the style `first` is holding.
//! let mut second = palette.styles_where(|_| true);
//! assert!(second.move_next());
//! assert_eq!(second.current(), Some(&"B"));
//!
//! // And `first` does not step onto the one `second` just took.
//! assert!(first.move_next());
//! assert_eq!(first.current(), Some(&"C"));
//!
//! // The rotation wraps around.
//! assert!(first.move_next());
//! assert_eq!(first.current(), Some(&"A"));
//! ```
//!
//! ## Predicates
//!
//! Each enumerator only hands out styles its predicate accepts. An enumerator
//! whose predicate accepts nothing is exhausted on the first call.
//!
//! ```rust
//! use understory_style_dispenser::{EnumeratorState, StyleDispenser};
//!
//! let palette = StyleDispenser::new();
//! palette.set_styles(Some(vec![1, 2, 3, 4]));
//!
//! let evens: Vec<i32> = palette.styles_where(|s| s % 2 == 0).take(3).collect();
//! assert_eq!(evens, [2, 4, 2]);
//!
//! let mut none = palette.styles_where(|s| *s > 10);
//! assert!(!none.move_next());
//! assert_eq!(none.state(), EnumeratorState::Exhausted);
//! ```
//!
//! ## Parents
//!
//! A dispenser without styles of its own forwards to its parent. A series
//! with no palette then shares the chart's rotation.
//!
//! ```rust
//! use understory_style_dispenser::StyleDispenser;
//!
//! let chart = StyleDispenser::new();
//! chart.set_styles(Some(vec!["red", "green", "blue"]));
//!
//! let series = StyleDispenser::new();
//! series.set_parent(Some(&chart)).unwrap();
//!
//! let mut from_series = series.styles_where(|_| true);
//! let mut from_chart = chart.styles_where(|_| true);
//! assert_eq!(from_series.next(), Some("red"));
//! assert_eq!(from_chart.next(), Some("green"));
//! ```
//!
//! ## Resets
//!
//! Editing the palette anywhere other than its tail, or calling
//! [`StyleDispenser::reset_styles`], clears the history and sends every live
//! enumerator back to the start. Individual enumerators cannot be rewound:
//! [`StyleEnumerator::reset`] always returns
//! [`DispenserError::ResetUnsupported`].
//!
//! ## Threading
//!
//! Dispensers and enumerators are single-threaded (`!Send`, `!Sync`).
//! Coordination depends on each call completing before the next begins.
//!
//! ## Diagnostics
//!
//! Claims, resets and registrations are reported through [`tracing`] at
//! `trace` and `debug` level. Install a subscriber in the application to
//! see them.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod change;
mod cursor;
mod dispenser;
mod enumerator;
mod error;
mod history;

pub use change::StylesChange;
pub use dispenser::{StyleDispenser, StyleDispenserBuilder, WeakStyleDispenser};
pub use enumerator::{EnumeratorId, EnumeratorState, StyleEnumerator};
pub use error::DispenserError;
pub use history::StyleDispensed;
