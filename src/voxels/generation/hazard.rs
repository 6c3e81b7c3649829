//! Ocean hazards: whirlpools, reefs, rogue waves and storms scattered over open water.

use cgmath::Point2;

use super::hash_coords;
use crate::voxels::chunk::{coord::ChunkCoord, CHUNK_DEPTH, CHUNK_WIDTH};

/// Chance that an open-water chunk carries a hazard.
pub const HAZARD_CHANCE: f32 = 0.02;

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HazardKind {
    WHIRLPOOL,
    REEF,
    ROGUE_WAVE,
    STORM,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hazard {
    pub kind: HazardKind,
    /// World column of the hazard's center.
    pub position: Point2<i32>,
    pub radius: f32,
    /// Strength in `[0, 1]`.
    pub intensity: f32,
}

/// Rolls the hazard of an open-water chunk.
///
/// Returns `None` for roughly 98% of chunks. The roll depends only on the seed and
/// the chunk coordinate.
pub fn roll_hazard(seed: u32, coord: ChunkCoord) -> Option<Hazard> {
    let mut rng = fastrand::Rng::with_seed(hash_coords(seed as u64 ^ 0x4A2A_4D, coord.x, coord.z));
    if rng.f32() >= HAZARD_CHANCE {
        return None;
    }

    let kind = match rng.u8(0..4) {
        0 => HazardKind::WHIRLPOOL,
        1 => HazardKind::REEF,
        2 => HazardKind::ROGUE_WAVE,
        _ => HazardKind::STORM,
    };
    let origin = coord.origin();
    let position = Point2::new(
        origin.x + rng.i32(0..CHUNK_WIDTH as i32),
        origin.z + rng.i32(0..CHUNK_DEPTH as i32),
    );
    let radius = match kind {
        HazardKind::WHIRLPOOL => 4.0 + rng.f32() * 4.0,
        HazardKind::REEF => 3.0 + rng.f32() * 5.0,
        HazardKind::ROGUE_WAVE => 6.0 + rng.f32() * 6.0,
        HazardKind::STORM => 16.0 + rng.f32() * 32.0,
    };

    Some(Hazard {
        kind,
        position,
        radius,
        intensity: 0.3 + rng.f32() * 0.7,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazards_are_rare_and_deterministic() {
        let mut count = 0;
        for x in -50..50 {
            for z in -50..50 {
                let coord = ChunkCoord::new(x, z);
                let a = roll_hazard(11, coord);
                assert_eq!(a, roll_hazard(11, coord));
                if let Some(hazard) = a {
                    count += 1;
                    assert!((0.3..=1.0).contains(&hazard.intensity));
                    assert_eq!(ChunkCoord::from_world(hazard.position.x, hazard.position.y), coord);
                }
            }
        }
        assert!(count > 50 && count < 400, "{count} hazards in 10000 chunks");
    }
}
