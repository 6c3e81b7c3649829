//! # Raycast
//!
//! Fixed-step ray marching through the chunk map. The ray advances in steps of
//! `RAYCAST_STEP` blocks and reports the first solid block whose cell it enters.
//! Unloaded chunks read as air, so rays pass through them.

use cgmath::{InnerSpace, Point3, Vector3};

use super::{block::block_type::BlockType, chunk_map::ChunkMap};

/// Distance the ray advances per sample, in blocks.
pub const RAYCAST_STEP: f32 = 0.1;
/// Longest ray marched; longer rays are shortened to this.
pub const MAX_RAYCAST_DISTANCE: f32 = 1024.0;

/// The first solid block along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// World position of the hit block
    pub position: Point3<i32>,
    pub block: BlockType,
    /// Distance along the ray to the sample that entered the block
    pub distance: f32,
}

/// Marches a ray from `origin` along `direction`.
///
/// # Arguments
/// * `chunks` - The chunk map to sample
/// * `origin` - World-space start of the ray
/// * `direction` - Ray direction; need not be normalized
/// * `max_distance` - Length of the ray in blocks, capped at `MAX_RAYCAST_DISTANCE`
///
/// # Returns
/// The first solid block hit, or `None` if the ray runs out, has no direction or
/// has a NaN length
pub fn raycast(
    chunks: &ChunkMap,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
) -> Option<RaycastHit> {
    if !(direction.magnitude2() > f32::EPSILON) || !(max_distance > 0.0) {
        return None;
    }
    let direction = direction.normalize();
    let steps = (max_distance.min(MAX_RAYCAST_DISTANCE) / RAYCAST_STEP).floor() as u32;

    let mut last_cell = None;
    for step in 0..=steps {
        let distance = step as f32 * RAYCAST_STEP;
        let sample = origin + direction * distance;
        let cell = Point3::new(
            sample.x.floor() as i32,
            sample.y.floor() as i32,
            sample.z.floor() as i32,
        );
        if last_cell == Some(cell) {
            continue;
        }
        last_cell = Some(cell);

        let block = chunks.block_at(cell);
        if block.is_solid() {
            return Some(RaycastHit {
                position: cell,
                block,
                distance,
            });
        }
    }
    None
}
