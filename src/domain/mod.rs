//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains the types and logic for one concern:
//! - `holding` — static portfolio positions
//! - `quote` — per-symbol quote derivation and the quote book state container
//! - `portfolio` — stateless reduction of a snapshot into portfolio totals

pub mod holding;
pub mod portfolio;
pub mod quote;
