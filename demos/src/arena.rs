//! A tiny arena scene driven entirely by scheduler callbacks.
//!
//! - a physics system at [`Priority::SCHEDULER`] that steps every frame
//! - a player updated every frame, whose "shield" timer pauses and resumes the spawner
//! - a spawner whose "wave" timer sends growing waves and cancels itself after the last one

use std::cell::RefCell;
use std::rc::Rc;

use redlilium_scheduler::{
    Priority, Scheduler, SchedulerConfig, SchedulerError, TargetIdAllocator, TimerOptions,
};
use thiserror::Error;

use crate::args::FrameLoopArgs;

/// Number of waves the spawner sends before unscheduling itself.
pub const WAVE_COUNT: u32 = 4;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What happened during a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArenaReport {
    pub frames: u32,
    pub physics_steps: u32,
    pub player_frames: u32,
    pub waves: u32,
    pub enemies_spawned: u32,
    pub shield_toggles: u32,
    /// Scaled time seen by the physics system.
    pub simulated_seconds: f32,
}

/// Builds the scheduler config from the optional config file and the flags.
pub fn build_config(args: &FrameLoopArgs) -> Result<SchedulerConfig, DemoError> {
    let mut config = load_config(args)?;
    if let Some(time_scale) = args.time_scale {
        config.time_scale = time_scale;
    }
    if let Some(pool_capacity) = args.pool_capacity {
        config.pool_capacity = pool_capacity;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "serialize-ron")]
fn load_config(args: &FrameLoopArgs) -> Result<SchedulerConfig, DemoError> {
    let Some(path) = args.config_path() else {
        return Ok(SchedulerConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| DemoError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Loaded scheduler config from {}", path.display());
    Ok(SchedulerConfig::from_ron_str(&text)?)
}

#[cfg(not(feature = "serialize-ron"))]
fn load_config(_args: &FrameLoopArgs) -> Result<SchedulerConfig, DemoError> {
    Ok(SchedulerConfig::default())
}

/// Runs the arena for `args.frames` frames and reports what fired.
pub fn run_arena(args: &FrameLoopArgs) -> Result<ArenaReport, DemoError> {
    let mut scheduler = Scheduler::with_config(build_config(args)?)?;
    let mut targets = TargetIdAllocator::new();
    let physics = targets.allocate();
    let player = targets.allocate();
    let spawner = targets.allocate();

    let report = Rc::new(RefCell::new(ArenaReport::default()));

    let stats = report.clone();
    scheduler.schedule_update(physics, Priority::SCHEDULER, false, move |_, dt| {
        let mut stats = stats.borrow_mut();
        stats.physics_steps += 1;
        stats.simulated_seconds += dt;
    });

    let stats = report.clone();
    scheduler.schedule_update(player, Priority::MEDIUM, false, move |_, _| {
        stats.borrow_mut().player_frames += 1;
    });

    let stats = report.clone();
    scheduler.schedule(
        "wave",
        spawner,
        TimerOptions::every(2.0).delay(1.0),
        move |scheduler, _| {
            let mut stats = stats.borrow_mut();
            stats.waves += 1;
            stats.enemies_spawned += stats.waves;
            log::info!("Wave {} spawns {} enemies", stats.waves, stats.waves);
            if stats.waves == WAVE_COUNT {
                log::info!("Last wave sent, spawner retires");
                scheduler.unschedule("wave", spawner);
            }
        },
    )?;

    let stats = report.clone();
    scheduler.schedule("shield", player, TimerOptions::every(3.0), move |scheduler, _| {
        stats.borrow_mut().shield_toggles += 1;
        if scheduler.is_target_paused(spawner) {
            log::info!("Shield down, spawner resumes");
            scheduler.resume_target(spawner);
        } else {
            log::info!("Shield up, spawner holds");
            scheduler.pause_target(spawner);
        }
    })?;

    for frame in 0..args.frames {
        scheduler.update(args.dt)?;
        if frame % 60 == 59 {
            log::debug!("Frame {}: {:?}", frame + 1, scheduler);
        }
    }

    let stats = scheduler.pool_stats();
    log::info!(
        "Pools: update entries {:?}, timer entries {:?}",
        stats.update_entries,
        stats.timer_entries
    );
    scheduler.unschedule_all();

    let mut report = report.borrow().clone();
    report.frames = args.frames;
    Ok(report)
}
