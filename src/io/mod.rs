//! Result export (CSV and JSON).

pub mod export;

pub use export::*;
