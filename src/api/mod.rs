//! clinicaltrials.gov API access.
//!
//! This module provides the field-values client and the source trait the
//! aggregator is written against.

pub mod client;

pub use client::{ClientConfig, FieldValuesClient, FieldValuesSource, DEFAULT_BASE_URL};
