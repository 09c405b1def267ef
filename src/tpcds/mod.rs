//! TPC-DS subset used by the micro-benchmarks

mod generator;
mod schema;

pub use generator::*;
pub use schema::*;
