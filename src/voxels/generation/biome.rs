//! # Biomes
//!
//! Climate classification from height, temperature and humidity, and the surface
//! materials each biome is built from.

use crate::voxels::block::block_type::BlockType;

/// Temperature below which a column counts as cold.
pub const COLD_THRESHOLD: f64 = -0.3;
/// Temperature above which a column counts as hot.
pub const HOT_THRESHOLD: f64 = 0.3;
/// Humidity below which a column counts as dry.
pub const DRY_THRESHOLD: f64 = -0.3;
/// Humidity above which a column counts as wet.
pub const WET_THRESHOLD: f64 = 0.3;

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Biome {
    OCEAN,
    BEACH,
    DESERT,
    SAVANNA,
    TROPICAL_FOREST,
    GRASSLAND,
    PLAINS,
    FOREST,
    TUNDRA,
}

/// Rows are cold, temperate and hot; columns are dry, normal and wet.
const CLIMATE_TABLE: [[Biome; 3]; 3] = [
    [Biome::TUNDRA, Biome::TUNDRA, Biome::FOREST],
    [Biome::GRASSLAND, Biome::PLAINS, Biome::FOREST],
    [Biome::DESERT, Biome::SAVANNA, Biome::TROPICAL_FOREST],
];

fn bucket(value: f64, low: f64, high: f64) -> usize {
    if value < low {
        0
    } else if value > high {
        2
    } else {
        1
    }
}

/// Classifies a land or sea column.
///
/// Anything at or below sea level is `OCEAN`. Land is looked up in a 3x3 climate
/// table by temperature and humidity bucket.
pub fn classify_biome(height: f32, sea_level: i32, temperature: f64, humidity: f64) -> Biome {
    if height <= sea_level as f32 {
        return Biome::OCEAN;
    }
    let row = bucket(temperature, COLD_THRESHOLD, HOT_THRESHOLD);
    let column = bucket(humidity, DRY_THRESHOLD, WET_THRESHOLD);
    CLIMATE_TABLE[row][column]
}

impl Biome {
    /// Top block of a land column.
    pub fn surface_block(self) -> BlockType {
        match self {
            Biome::OCEAN => BlockType::GRAVEL,
            Biome::BEACH | Biome::DESERT => BlockType::SAND,
            Biome::TUNDRA => BlockType::SNOW,
            _ => BlockType::GRASS,
        }
    }

    /// The few blocks between the surface and stone.
    pub fn subsurface_block(self) -> BlockType {
        match self {
            Biome::OCEAN | Biome::BEACH | Biome::DESERT => BlockType::SAND,
            _ => BlockType::DIRT,
        }
    }

    /// Probability that a vegetation cell of this biome grows a tree.
    pub fn tree_density(self) -> f32 {
        match self {
            Biome::TROPICAL_FOREST => 0.06,
            Biome::FOREST => 0.045,
            Biome::SAVANNA => 0.008,
            Biome::PLAINS | Biome::GRASSLAND => 0.004,
            Biome::TUNDRA => 0.002,
            Biome::DESERT => 0.006,
            Biome::OCEAN | Biome::BEACH => 0.0,
        }
    }

    /// Whether the biome grows cacti instead of trees.
    pub fn grows_cacti(self) -> bool {
        self == Biome::DESERT
    }

    /// Whether an ocean surface of this climate freezes over.
    pub fn freezes(temperature: f64) -> bool {
        temperature < COLD_THRESHOLD - 0.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_or_at_sea_level_is_ocean() {
        assert_eq!(classify_biome(64.0, 64, 0.9, 0.9), Biome::OCEAN);
        assert_eq!(classify_biome(10.0, 64, -0.9, -0.9), Biome::OCEAN);
    }

    #[test]
    fn climate_table_corners() {
        assert_eq!(classify_biome(70.0, 64, -0.5, -0.5), Biome::TUNDRA);
        assert_eq!(classify_biome(70.0, 64, -0.5, 0.5), Biome::FOREST);
        assert_eq!(classify_biome(70.0, 64, 0.5, -0.5), Biome::DESERT);
        assert_eq!(classify_biome(70.0, 64, 0.5, 0.0), Biome::SAVANNA);
        assert_eq!(classify_biome(70.0, 64, 0.5, 0.5), Biome::TROPICAL_FOREST);
        assert_eq!(classify_biome(70.0, 64, 0.0, 0.0), Biome::PLAINS);
        assert_eq!(classify_biome(70.0, 64, 0.0, -0.5), Biome::GRASSLAND);
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(classify_biome(70.0, 64, -0.3, 0.3), Biome::PLAINS);
        assert_eq!(classify_biome(70.0, 64, 0.3, -0.3), Biome::PLAINS);
    }
}
