//! # Frame Loop Demo
//!
//! Drives the arena scene headlessly and logs what the scheduler fired.

use clap::Parser;
use redlilium_scheduler_demos::{FrameLoopArgs, run_arena};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = FrameLoopArgs::parse();
    log::info!(
        "Running {} frames at dt = {} (scheduler v{})",
        args.frames,
        args.dt,
        redlilium_scheduler::VERSION
    );

    match run_arena(&args) {
        Ok(report) => log::info!("Done: {report:?}"),
        Err(err) => {
            log::error!("Frame loop failed: {err}");
            std::process::exit(1);
        }
    }
}
