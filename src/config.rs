//! # World Configuration
//!
//! Tunables for world generation and streaming, loadable from JSON. Every field has
//! a default, so a config file only needs to name what it changes:
//!
//! ```rust
//! use voxel_world::config::WorldConfig;
//!
//! let config = WorldConfig::from_json_str(r#"{ "seed": 7, "load_distance": 4 }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.sea_level, 64);
//! ```

use std::{fmt, fs, io, path::Path, thread};

use serde::{Deserialize, Serialize};

use crate::voxels::{chunk::CHUNK_HEIGHT, generation::GenerationSettings};

/// Everything that can go wrong loading a config.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io(io::Error),
    /// The text is not valid config JSON
    Parse(serde_json::Error),
    /// The values parsed but are out of range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read config: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// World generation and streaming settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u32,
    /// Water surface height in blocks
    pub sea_level: i32,
    /// Highest terrain an island peak may reach
    pub max_height: i32,
    /// Radius in chunks of the disc kept loaded around the viewpoint
    pub load_distance: u32,
    /// Radius in chunks beyond which loaded chunks are not drawn
    pub render_distance: u32,
    /// Cap on generation submissions and on mesh builds per tick
    pub max_chunks_per_frame: usize,
    /// Generation workers; `None` sizes the pool from the available parallelism
    pub generation_threads: Option<usize>,
    /// Mesh workers; `None` sizes the pool from the available parallelism
    pub mesh_threads: Option<usize>,
    /// Capacity of the world-chunk field cache
    pub world_chunk_cache_capacity: usize,
    /// Initial time of day in hours
    pub time_of_day: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: 0,
            sea_level: 64,
            max_height: 128,
            load_distance: 8,
            render_distance: 8,
            max_chunks_per_frame: 4,
            generation_threads: None,
            mesh_threads: None,
            world_chunk_cache_capacity: 1024,
            time_of_day: 12.0,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let height = CHUNK_HEIGHT as i32;
        if !(1..height).contains(&self.sea_level) {
            return Err(ConfigError::Invalid(format!(
                "sea_level {} must lie in 1..{height}",
                self.sea_level
            )));
        }
        if self.max_height <= self.sea_level || self.max_height >= height {
            return Err(ConfigError::Invalid(format!(
                "max_height {} must lie above sea_level {} and below {height}",
                self.max_height, self.sea_level
            )));
        }
        if self.load_distance == 0 {
            return Err(ConfigError::Invalid("load_distance must be at least 1".into()));
        }
        if self.max_chunks_per_frame == 0 {
            return Err(ConfigError::Invalid("max_chunks_per_frame must be at least 1".into()));
        }
        if self.world_chunk_cache_capacity == 0 {
            return Err(ConfigError::Invalid("world_chunk_cache_capacity must be at least 1".into()));
        }
        if !self.time_of_day.is_finite() {
            return Err(ConfigError::Invalid("time_of_day must be finite".into()));
        }
        Ok(())
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            seed: self.seed,
            sea_level: self.sea_level,
            max_height: self.max_height,
        }
    }

    /// Worker count of the generation pool.
    pub fn generation_workers(&self) -> usize {
        self.generation_threads.unwrap_or_else(default_workers)
    }

    /// Worker count of the mesh pool.
    pub fn mesh_workers(&self) -> usize {
        self.mesh_threads.unwrap_or_else(default_workers)
    }
}

fn default_workers() -> usize {
    let available = thread::available_parallelism().map(usize::from).unwrap_or(2);
    (available / 2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(WorldConfig::from_json_str("{}").unwrap(), WorldConfig::default());
    }

    #[test]
    fn unknown_shapes_are_parse_errors() {
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "seed": "seven" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for json in [
            r#"{ "sea_level": 0 }"#,
            r#"{ "sea_level": 100, "max_height": 90 }"#,
            r#"{ "max_height": 300 }"#,
            r#"{ "load_distance": 0 }"#,
            r#"{ "max_chunks_per_frame": 0 }"#,
        ] {
            assert!(
                matches!(WorldConfig::from_json_str(json), Err(ConfigError::Invalid(_))),
                "{json} should be invalid"
            );
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = WorldConfig::from_file("/nonexistent/voxel-world.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("failed to read config"));
    }

    #[test]
    fn thread_overrides_are_respected() {
        let config = WorldConfig {
            generation_threads: Some(3),
            mesh_threads: Some(0),
            ..WorldConfig::default()
        };
        assert_eq!(config.generation_workers(), 3);
        assert_eq!(config.mesh_workers(), 0);
        assert!(WorldConfig::default().generation_workers() >= 1);
    }
}
