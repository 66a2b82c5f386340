//! Simulated field extraction and unit conversion.

pub mod error;
pub mod extractor;
pub mod units;
