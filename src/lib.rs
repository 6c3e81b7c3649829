#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A streaming voxel world core: an endless ocean dotted with procedurally generated
//! islands, generated, lit and meshed chunk by chunk around a moving viewpoint.
//!
//! ## Key Modules
//!
//! * `core` - Shared-ownership primitive used across the worker pools
//! * `voxels` - Blocks, chunks, world generation, lighting and the `World` orchestrator
//! * `rendering` - Face-culled chunk meshes and render-list assembly
//! * `task_management` - Worker pools for generation and meshing
//! * `config` - JSON-loadable world settings
//!
//! ## Architecture
//!
//! The `World` owns a concurrent chunk map and two worker pools. Each tick it compares
//! the chunks within `load_distance` of the viewpoint against the loaded set, submits
//! generation for the missing ones and unloads the rest. Generated chunks are lit on
//! the worker, installed on the orchestrating thread, wired to their neighbors, and
//! meshed on the second pool whenever they are dirty. Rendering reads the resulting
//! meshes through `World::render_commands`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use voxel_world::{config::WorldConfig, voxels::world::World};
//! use cgmath::Point3;
//! use web_time::Duration;
//!
//! let mut world = World::new(WorldConfig::default());
//! let viewpoint = Point3::new(0.0, 100.0, 0.0);
//! world.update(&viewpoint);
//! world.wait_for_idle(Duration::from_secs(30));
//! println!("{} draw commands", world.render_commands().len());
//! ```

use std::env;

use cgmath::Point3;
use log::{error, info};
use web_time::{Duration, Instant};

pub mod config;
pub mod core;
pub mod rendering;
pub mod task_management;
pub mod voxels;

use config::{ConfigError, WorldConfig};
use voxels::{viewpoint::FlyoverPath, world::World};

/// Environment variable naming a config file when none is given on the command line.
pub const CONFIG_ENV_VAR: &str = "VOXEL_WORLD_CONFIG";

/// Simulated frame time of the headless driver.
const FRAME_TIME: Duration = Duration::from_millis(16);
/// Frames the headless driver runs before reporting.
const HEADLESS_FRAMES: u32 = 600;
/// Flyover speed in blocks per second.
const FLYOVER_SPEED: f32 = 24.0;

fn load_config() -> Result<WorldConfig, ConfigError> {
    let path = env::args().nth(1).or_else(|| env::var(CONFIG_ENV_VAR).ok());
    match path {
        Some(path) => {
            info!("Loading config from {path}");
            WorldConfig::from_file(path)
        }
        None => Ok(WorldConfig::default()),
    }
}

/// Runs the headless driver: initializes logging, loads the config, flies a loop
/// over the world for a fixed number of frames and logs the final stats.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let altitude = config.max_height as f32 + 16.0;
    let reach = (config.load_distance as f32) * 16.0 * 2.0;
    let mut flyover = FlyoverPath::new(
        vec![
            Point3::new(0.0, altitude, 0.0),
            Point3::new(reach, altitude, 0.0),
            Point3::new(reach, altitude, reach),
            Point3::new(0.0, altitude, reach),
        ],
        FLYOVER_SPEED,
    );

    let mut world = World::new(config);
    let started = Instant::now();
    for frame in 0..HEADLESS_FRAMES {
        world.update(&flyover);
        flyover.advance(FRAME_TIME);
        if frame % 60 == 0 {
            info!(
                "Frame {frame}: {} loaded, {} draw commands",
                world.chunks().len(),
                world.render_commands().len()
            );
        }
        std::thread::sleep(FRAME_TIME);
    }

    if !world.wait_for_idle(Duration::from_secs(30)) {
        error!("World did not settle after the flyover");
    }
    let stats = world.stats();
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => info!("Finished in {:?}: {json}", started.elapsed()),
        Err(err) => error!("Failed to serialize stats: {err}"),
    }
}
