//! Domain types used throughout the selection pipeline.
//!
//! This module defines:
//!
//! - the strategy enumeration (`SelectorKind`)
//! - shared selection configuration (`SelectConfig`)
//! - per-word selection outcomes used for reporting/export (`WordSelection`)

pub mod types;

pub use types::*;
