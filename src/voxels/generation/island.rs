//! # Islands
//!
//! Procedurally generated landmasses. An island is fully determined by the world
//! seed, its center and its type: its heightmap, biome map, vegetation map,
//! features and structures are all derived from those three inputs, so every chunk
//! that overlaps an island sees exactly the same landmass no matter which chunk
//! asked for it first.

use bitvec::prelude::BitVec;
use cgmath::{Point2, Point3};

use super::{
    biome::{classify_biome, Biome},
    hash_coords,
    noise_generator::{FractalParams, NoiseGenerator},
    GenerationSettings,
};
use crate::voxels::block::block_type::BlockType;

/// Height reported for every coordinate outside an island's footprint.
pub const DEEP_OCEAN_HEIGHT: f32 = 20.0;
/// Largest radius of any island type.
pub const MAX_ISLAND_RADIUS: i32 = 52;

const DETAIL: FractalParams = FractalParams::new(4, 0.5, 2.0);

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IslandType {
    TROPICAL,
    VOLCANIC,
    ROCKY,
    ARCTIC,
    DESERT,
    ATOLL,
}

/// Outline family of an island's footprint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IslandShape {
    ROUND,
    ELONGATED,
    CRESCENT,
    RING,
}

/// Climate offsets applied on top of the island's own climate noise.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IslandClimate {
    pub temperature: f64,
    pub humidity: f64,
}

impl IslandType {
    pub const ALL: [IslandType; 6] = [
        IslandType::TROPICAL,
        IslandType::VOLCANIC,
        IslandType::ROCKY,
        IslandType::ARCTIC,
        IslandType::DESERT,
        IslandType::ATOLL,
    ];

    /// Footprint radius in blocks.
    pub fn radius(self) -> i32 {
        match self {
            IslandType::TROPICAL => 48,
            IslandType::VOLCANIC => 40,
            IslandType::ROCKY => 32,
            IslandType::ARCTIC => 44,
            IslandType::DESERT => MAX_ISLAND_RADIUS,
            IslandType::ATOLL => 36,
        }
    }

    /// Peak height above sea level before clamping to the world's max height.
    pub fn peak_above_sea(self) -> f32 {
        match self {
            IslandType::TROPICAL => 30.0,
            IslandType::VOLCANIC => 60.0,
            IslandType::ROCKY => 40.0,
            IslandType::ARCTIC => 25.0,
            IslandType::DESERT => 22.0,
            IslandType::ATOLL => 6.0,
        }
    }

    pub fn climate(self) -> IslandClimate {
        let (temperature, humidity) = match self {
            IslandType::TROPICAL => (0.6, 0.6),
            IslandType::VOLCANIC => (0.4, 0.0),
            IslandType::ROCKY => (0.0, 0.0),
            IslandType::ARCTIC => (-0.7, 0.1),
            IslandType::DESERT => (0.7, -0.7),
            IslandType::ATOLL => (0.5, 0.4),
        };
        IslandClimate {
            temperature,
            humidity,
        }
    }

    pub fn shape(self) -> IslandShape {
        match self {
            IslandType::TROPICAL | IslandType::VOLCANIC => IslandShape::ROUND,
            IslandType::ROCKY | IslandType::DESERT => IslandShape::ELONGATED,
            IslandType::ARCTIC => IslandShape::CRESCENT,
            IslandType::ATOLL => IslandShape::RING,
        }
    }

    /// Picks the type of the island in an island cell.
    ///
    /// Cells far from the equator (large |z|) lean arctic, cells near it lean
    /// tropical; a hash of `(seed, cell)` breaks ties. The result depends only on its
    /// arguments.
    pub fn select(seed: u32, cell_x: i32, cell_z: i32) -> IslandType {
        let roll = (hash_coords(seed as u64 ^ 0x15_1A_4D, cell_x, cell_z) % 100) as u32;
        let latitude = (cell_z as f64 * 0.35).sin().abs();
        if latitude > 0.8 {
            if roll < 60 {
                IslandType::ARCTIC
            } else {
                IslandType::ROCKY
            }
        } else if latitude < 0.3 {
            match roll {
                0..=34 => IslandType::TROPICAL,
                35..=59 => IslandType::ATOLL,
                60..=79 => IslandType::DESERT,
                _ => IslandType::VOLCANIC,
            }
        } else {
            match roll {
                0..=24 => IslandType::ROCKY,
                25..=49 => IslandType::VOLCANIC,
                50..=74 => IslandType::TROPICAL,
                _ => IslandType::DESERT,
            }
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IslandFeatureKind {
    PEAK,
    CRATER,
    LAGOON,
    CAVE_MOUTH,
}

/// A named landmark of an island, in world coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IslandFeature {
    pub kind: IslandFeatureKind,
    pub position: Point2<i32>,
    pub radius: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StructureKind {
    LIGHTHOUSE,
    DOCK,
    RUINS,
}

/// A man-made structure standing on an island.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Structure {
    pub kind: StructureKind,
    /// World column of the structure's anchor block.
    pub position: Point2<i32>,
    /// Surface height under the anchor.
    pub base_height: i32,
    /// Unit step pointing away from the island center, used by docks.
    pub facing: Point2<i32>,
}

impl Structure {
    /// World positions and blocks that make up the structure.
    pub fn blocks(&self, sea_level: i32) -> Vec<(Point3<i32>, BlockType)> {
        let Point2 { x, y: z } = self.position;
        let mut blocks = Vec::new();
        match self.kind {
            StructureKind::LIGHTHOUSE => {
                for dy in 1..=9 {
                    blocks.push((Point3::new(x, self.base_height + dy, z), BlockType::STONE));
                }
                blocks.push((Point3::new(x, self.base_height + 10, z), BlockType::LANTERN));
            }
            StructureKind::DOCK => {
                let deck = sea_level + 1;
                for step in 0..7 {
                    let px = x + self.facing.x * step;
                    let pz = z + self.facing.y * step;
                    blocks.push((Point3::new(px, deck, pz), BlockType::PLANKS));
                    if step % 3 == 2 {
                        for post in (sea_level - 3)..deck {
                            blocks.push((Point3::new(px, post, pz), BlockType::WOOD));
                        }
                    }
                }
                let end_x = x + self.facing.x * 6;
                let end_z = z + self.facing.y * 6;
                blocks.push((Point3::new(end_x, deck + 1, end_z), BlockType::TORCH));
            }
            StructureKind::RUINS => {
                for (dx, dz, height) in [(-1, -1, 3), (1, -1, 2), (-1, 1, 1), (1, 1, 2)] {
                    for dy in 1..=height {
                        blocks.push((
                            Point3::new(x + dx, self.base_height + dy, z + dz),
                            BlockType::STONE,
                        ));
                    }
                }
            }
        }
        blocks
    }
}

/// A generated landmass.
#[derive(Clone, Debug)]
pub struct Island {
    center: Point2<i32>,
    island_type: IslandType,
    seed: u64,
    radius: i32,
    side: usize,
    heightmap: Vec<f32>,
    biome_map: Vec<Biome>,
    vegetation: BitVec,
    features: Vec<IslandFeature>,
    structures: Vec<Structure>,
}

impl Island {
    /// Generates the island of type `island_type` centered at world column `center`.
    pub fn generate(
        center: Point2<i32>,
        island_type: IslandType,
        settings: &GenerationSettings,
    ) -> Island {
        let seed = hash_coords(settings.seed as u64, center.x, center.y);
        let noise = NoiseGenerator::new(seed as u32);
        let radius = island_type.radius();
        let side = (2 * radius + 1) as usize;
        let sea_level = settings.sea_level as f32;
        let peak = (sea_level + island_type.peak_above_sea()).min(settings.max_height as f32);
        let climate = island_type.climate();
        let axis = (seed % 628) as f64 / 100.0;

        let mut heightmap = vec![DEEP_OCEAN_HEIGHT; side * side];
        let mut biome_map = vec![Biome::OCEAN; side * side];

        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let index = Self::local_index(radius, dx, dz);
                let distance =
                    shape_distance(island_type.shape(), dx as f64, dz as f64, radius as f64, axis, &noise);
                if distance >= 1.0 {
                    continue;
                }

                let wx = (center.x + dx) as f64;
                let wz = (center.y + dz) as f64;
                let detail = noise.fractal(wx * 0.05, wz * 0.05, DETAIL);
                let profile = elevation_profile(island_type, distance);
                let height = DEEP_OCEAN_HEIGHT
                    + (peak - DEEP_OCEAN_HEIGHT) * (profile * (0.85 + 0.15 * detail)) as f32;
                heightmap[index] = height;

                let elevation = ((height - sea_level) / (peak - sea_level).max(1.0)) as f64;
                let temperature =
                    climate.temperature + 0.25 * noise.sample_2d(wx * 0.02, wz * 0.02) - 0.4 * elevation.max(0.0);
                let humidity = climate.humidity + 0.25 * noise.sample_2d(wz * 0.02 + 100.0, wx * 0.02);
                biome_map[index] = if height > sea_level && height <= sea_level + 2.0 {
                    Biome::BEACH
                } else {
                    classify_biome(height, settings.sea_level, temperature, humidity)
                };
            }
        }

        let mut vegetation = BitVec::repeat(false, side * side);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let index = Self::local_index(radius, dx, dz);
                let biome = biome_map[index];
                if heightmap[index] <= sea_level + 2.0 || biome.tree_density() <= 0.0 {
                    continue;
                }
                let crowded = (dx > -radius && vegetation[index - 1])
                    || (dz > -radius && vegetation[index - side]);
                if crowded {
                    continue;
                }
                let roll =
                    (hash_coords(seed, center.x + dx, center.y + dz) % 10_000) as f32 / 10_000.0;
                if roll < biome.tree_density() {
                    vegetation.set(index, true);
                }
            }
        }

        let mut island = Island {
            center,
            island_type,
            seed,
            radius,
            side,
            heightmap,
            biome_map,
            vegetation,
            features: Vec::new(),
            structures: Vec::new(),
        };
        island.features = island.place_features();
        island.structures = island.place_structures(settings.sea_level);
        island
    }

    fn local_index(radius: i32, dx: i32, dz: i32) -> usize {
        let side = 2 * radius + 1;
        ((dz + radius) * side + (dx + radius)) as usize
    }

    fn local(&self, wx: i32, wz: i32) -> Option<usize> {
        let dx = wx - self.center.x;
        let dz = wz - self.center.y;
        if dx.abs() > self.radius || dz.abs() > self.radius {
            return None;
        }
        Some(Self::local_index(self.radius, dx, dz))
    }

    pub fn center(&self) -> Point2<i32> {
        self.center
    }

    pub fn island_type(&self) -> IslandType {
        self.island_type
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Side length of the square maps.
    pub fn map_side(&self) -> usize {
        self.side
    }

    /// Whether the world column lies within the island's square footprint.
    pub fn contains(&self, wx: i32, wz: i32) -> bool {
        self.local(wx, wz).is_some()
    }

    /// Whether the island's square footprint overlaps the given world rectangle
    /// (inclusive bounds).
    pub fn intersects(&self, min: Point2<i32>, max: Point2<i32>) -> bool {
        self.center.x + self.radius >= min.x
            && self.center.x - self.radius <= max.x
            && self.center.y + self.radius >= min.y
            && self.center.y - self.radius <= max.y
    }

    /// Terrain height, or `DEEP_OCEAN_HEIGHT` outside the footprint.
    pub fn height_at(&self, wx: i32, wz: i32) -> f32 {
        self.local(wx, wz).map_or(DEEP_OCEAN_HEIGHT, |index| self.heightmap[index])
    }

    /// Biome, or `OCEAN` outside the footprint.
    pub fn biome_at(&self, wx: i32, wz: i32) -> Biome {
        self.local(wx, wz).map_or(Biome::OCEAN, |index| self.biome_map[index])
    }

    /// Whether a tree or cactus grows in this column.
    pub fn has_vegetation(&self, wx: i32, wz: i32) -> bool {
        self.local(wx, wz).is_some_and(|index| self.vegetation[index])
    }

    pub fn features(&self) -> &[IslandFeature] {
        &self.features
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    fn place_features(&self) -> Vec<IslandFeature> {
        let mut features = Vec::new();

        let peak_index = self
            .heightmap
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
            .unwrap_or(0);
        features.push(IslandFeature {
            kind: IslandFeatureKind::PEAK,
            position: self.world_of_index(peak_index),
            radius: 1,
        });

        match self.island_type {
            IslandType::VOLCANIC => features.push(IslandFeature {
                kind: IslandFeatureKind::CRATER,
                position: self.center,
                radius: (self.radius as f32 * 0.12) as i32,
            }),
            IslandType::ATOLL => features.push(IslandFeature {
                kind: IslandFeatureKind::LAGOON,
                position: self.center,
                radius: (self.radius as f32 * 0.6) as i32,
            }),
            IslandType::ROCKY => {
                let mut rng = fastrand::Rng::with_seed(self.seed ^ 0xCA7E);
                for _ in 0..rng.usize(0..=2) {
                    let index = rng.usize(0..self.heightmap.len());
                    features.push(IslandFeature {
                        kind: IslandFeatureKind::CAVE_MOUTH,
                        position: self.world_of_index(index),
                        radius: 2,
                    });
                }
            }
            _ => {}
        }

        features
    }

    fn place_structures(&self, sea_level: i32) -> Vec<Structure> {
        let mut rng = fastrand::Rng::with_seed(self.seed ^ 0x57_2C_70);
        let beaches: Vec<usize> = (0..self.biome_map.len())
            .filter(|&index| self.biome_map[index] == Biome::BEACH)
            .collect();
        let inland: Vec<usize> = (0..self.biome_map.len())
            .filter(|&index| self.heightmap[index] > sea_level as f32 + 4.0)
            .collect();

        let mut structures = Vec::new();
        let mut place = |kind: StructureKind, candidates: &[usize], rng: &mut fastrand::Rng| {
            if candidates.is_empty() {
                return;
            }
            let index = candidates[rng.usize(0..candidates.len())];
            let position = self.world_of_index(index);
            let away = Point2::new(position.x - self.center.x, position.y - self.center.y);
            let facing = if away.x.abs() >= away.y.abs() {
                Point2::new(away.x.signum(), 0)
            } else {
                Point2::new(0, away.y.signum())
            };
            structures.push(Structure {
                kind,
                position,
                base_height: self.heightmap[index].floor() as i32,
                facing,
            });
        };

        if rng.f32() < 0.35 {
            place(StructureKind::LIGHTHOUSE, &beaches, &mut rng);
        }
        if rng.f32() < 0.4 {
            place(StructureKind::DOCK, &beaches, &mut rng);
        }
        if rng.f32() < 0.2 {
            place(StructureKind::RUINS, &inland, &mut rng);
        }
        structures
    }

    fn world_of_index(&self, index: usize) -> Point2<i32> {
        let dx = (index % self.side) as i32 - self.radius;
        let dz = (index / self.side) as i32 - self.radius;
        Point2::new(self.center.x + dx, self.center.y + dz)
    }
}

/// Normalized distance from the island center through the island's outline; the
/// outline sits at 1.0.
fn shape_distance(
    shape: IslandShape,
    dx: f64,
    dz: f64,
    radius: f64,
    axis: f64,
    noise: &NoiseGenerator,
) -> f64 {
    let angle = dz.atan2(dx);
    let wobble = 0.85 + 0.15 * noise.sample_2d(angle.cos() * 1.7 + 3.3, angle.sin() * 1.7 - 5.1);
    match shape {
        IslandShape::ROUND | IslandShape::RING => (dx * dx + dz * dz).sqrt() / (radius * wobble),
        IslandShape::ELONGATED => {
            let (sin, cos) = axis.sin_cos();
            let u = dx * cos + dz * sin;
            let v = -dx * sin + dz * cos;
            (u * u + (v / 0.55) * (v / 0.55)).sqrt() / (radius * wobble)
        }
        IslandShape::CRESCENT => {
            let base = (dx * dx + dz * dz).sqrt() / (radius * wobble);
            let (sin, cos) = axis.sin_cos();
            let bite_x = dx - cos * radius * 0.45;
            let bite_z = dz - sin * radius * 0.45;
            let bite = (bite_x * bite_x + bite_z * bite_z).sqrt() / (radius * 0.5);
            if bite < 1.0 {
                base + (1.0 - bite) * 1.5
            } else {
                base
            }
        }
    }
}

/// Fraction of the island's peak reached at normalized distance `distance`.
fn elevation_profile(island_type: IslandType, distance: f64) -> f64 {
    let dome = (1.0 - distance * distance).powf(1.5);
    match island_type {
        IslandType::VOLCANIC => {
            if distance < 0.12 {
                dome * 0.8
            } else {
                dome
            }
        }
        IslandType::ATOLL => {
            let ring = 1.0 - ((distance - 0.8) / 0.2).abs();
            if ring > 0.0 {
                0.7 + 0.3 * ring
            } else {
                0.55 * dome
            }
        }
        _ => dome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            seed: 77,
            sea_level: 64,
            max_height: 128,
        }
    }

    #[test]
    fn outside_footprint_is_deep_ocean() {
        let island = Island::generate(Point2::new(100, -40), IslandType::TROPICAL, &settings());
        let far = island.center().x + island.radius() + 1;
        assert_eq!(island.height_at(far, -40), DEEP_OCEAN_HEIGHT);
        assert_eq!(island.biome_at(far, -40), Biome::OCEAN);
        assert!(!island.has_vegetation(far, -40));
    }

    #[test]
    fn generation_is_a_function_of_center_and_type() {
        let a = Island::generate(Point2::new(-300, 512), IslandType::VOLCANIC, &settings());
        let b = Island::generate(Point2::new(-300, 512), IslandType::VOLCANIC, &settings());
        for dz in -a.radius()..=a.radius() {
            for dx in -a.radius()..=a.radius() {
                let (wx, wz) = (-300 + dx, 512 + dz);
                assert_eq!(a.height_at(wx, wz).to_bits(), b.height_at(wx, wz).to_bits());
                assert_eq!(a.biome_at(wx, wz), b.biome_at(wx, wz));
                assert_eq!(a.has_vegetation(wx, wz), b.has_vegetation(wx, wz));
            }
        }
        assert_eq!(a.structures(), b.structures());
        assert_eq!(a.features(), b.features());
    }

    #[test]
    fn center_rises_above_sea_level() {
        for island_type in [IslandType::TROPICAL, IslandType::ROCKY, IslandType::DESERT] {
            let island = Island::generate(Point2::new(0, 0), island_type, &settings());
            assert!(island.height_at(0, 0) > 64.0, "{island_type:?} center is submerged");
        }
    }

    #[test]
    fn peaks_respect_max_height() {
        let settings = GenerationSettings {
            seed: 5,
            sea_level: 64,
            max_height: 90,
        };
        let island = Island::generate(Point2::new(0, 0), IslandType::VOLCANIC, &settings);
        let side = island.radius();
        for dz in -side..=side {
            for dx in -side..=side {
                assert!(island.height_at(dx, dz) <= 90.0);
            }
        }
    }

    #[test]
    fn type_selection_is_deterministic() {
        for cell in -20..20 {
            assert_eq!(IslandType::select(9, cell, -cell), IslandType::select(9, cell, -cell));
        }
    }

    #[test]
    fn volcanic_islands_have_a_crater() {
        let island = Island::generate(Point2::new(0, 0), IslandType::VOLCANIC, &settings());
        assert!(island
            .features()
            .iter()
            .any(|feature| feature.kind == IslandFeatureKind::CRATER));
    }
}
