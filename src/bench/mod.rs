//! Micro-benchmark driver

mod queries;
mod runner;
mod suite;

pub use queries::*;
pub use runner::*;
pub use suite::*;
