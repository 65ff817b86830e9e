//! Analysis modules.
//!
//! Turns raw field-value histograms into per-sponsor results.

pub mod aggregator;

pub use aggregator::*;
