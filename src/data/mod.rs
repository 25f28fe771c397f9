//! Synthetic corpus generation.
//!
//! Corpus I/O from disk is out of scope for this tool, so the binary runs
//! against a generated vocabulary instead.

pub mod synthetic;

pub use synthetic::*;
