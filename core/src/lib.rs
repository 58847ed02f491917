//! # RedLilium Engine Core
//!
//! Core crate for RedLilium Engine basic utilities: bounded object pools
//! for per-frame bookkeeping and optional Tracy instrumentation.

pub mod pool;
pub mod profiling;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
