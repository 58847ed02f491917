//! Command line arguments for the demo frame loop.

use std::path::PathBuf;

use clap::Parser;

/// RedLilium scheduler frame loop demo.
///
/// # Examples
///
/// ```bash
/// # Run 300 frames at 60 Hz
/// ./frame_loop --frames 300
///
/// # Slow motion with entry recycling disabled
/// ./frame_loop --time-scale 0.25 --pool-capacity 0
///
/// # Verbose scheduler logging
/// RUST_LOG=debug ./frame_loop
/// ```
#[derive(Parser, Debug, Clone)]
#[command(
    name = "frame_loop",
    about = "Drives a small arena scene through the RedLilium scheduler"
)]
pub struct FrameLoopArgs {
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Seconds per frame handed to the scheduler.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub dt: f32,

    /// Global time scale (1.0 = real time).
    #[arg(long)]
    pub time_scale: Option<f32>,

    /// Retired entries kept per pool (0 disables recycling).
    #[arg(long)]
    pub pool_capacity: Option<usize>,

    /// RON file with scheduler settings. Command line flags override it.
    #[cfg(feature = "serialize-ron")]
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Default for FrameLoopArgs {
    fn default() -> Self {
        Self {
            frames: 600,
            dt: 1.0 / 60.0,
            time_scale: None,
            pool_capacity: None,
            #[cfg(feature = "serialize-ron")]
            config: None,
        }
    }
}

impl FrameLoopArgs {
    /// Path of the RON config file, if one was given.
    pub fn config_path(&self) -> Option<&PathBuf> {
        #[cfg(feature = "serialize-ron")]
        {
            self.config.as_ref()
        }
        #[cfg(not(feature = "serialize-ron"))]
        {
            None
        }
    }
}
