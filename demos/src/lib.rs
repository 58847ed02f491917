//! # RedLilium Scheduler Demos
//!
//! Headless frame loops showcasing the scheduler.
//!
//! ## Available Demos
//!
//! - `frame_loop` - A small arena scene driven by update callbacks and timers

pub mod args;
pub mod arena;

pub use args::FrameLoopArgs;
pub use arena::{ArenaReport, DemoError, run_arena};

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
