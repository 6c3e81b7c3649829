use cgmath::Point3;

use crate::voxels::block::block_side::BlockSide;

/// UV coordinates of a quad's corners, in corner order.
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Indices of a quad's two triangles, fanned from corner 0.
pub const FACE_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// A single quad face of a block.
///
/// Corners are ordered lower-left, lower-right, upper-right, upper-left as seen from
/// outside the block, which makes both triangles of the fan wind counter-clockwise
/// around the face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Corner positions in chunk-local block units
    pub corners: [Point3<f32>; 4],
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face on `block_side` of the block at `(x, y, z)`.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - Chunk-local coordinates of the block
    /// * `block_side` - Which side of the block this face represents
    pub fn new(x: i32, y: i32, z: i32, block_side: BlockSide) -> Self {
        let (x0, y0, z0) = (x as f32, y as f32, z as f32);
        let (x1, y1, z1) = (x0 + 1.0, y0 + 1.0, z0 + 1.0);
        let corners = match block_side {
            BlockSide::FRONT => [
                Point3::new(x0, y0, z1),
                Point3::new(x1, y0, z1),
                Point3::new(x1, y1, z1),
                Point3::new(x0, y1, z1),
            ],
            BlockSide::BACK => [
                Point3::new(x1, y0, z0),
                Point3::new(x0, y0, z0),
                Point3::new(x0, y1, z0),
                Point3::new(x1, y1, z0),
            ],
            BlockSide::BOTTOM => [
                Point3::new(x0, y0, z0),
                Point3::new(x1, y0, z0),
                Point3::new(x1, y0, z1),
                Point3::new(x0, y0, z1),
            ],
            BlockSide::TOP => [
                Point3::new(x0, y1, z1),
                Point3::new(x1, y1, z1),
                Point3::new(x1, y1, z0),
                Point3::new(x0, y1, z0),
            ],
            BlockSide::LEFT => [
                Point3::new(x0, y0, z0),
                Point3::new(x0, y0, z1),
                Point3::new(x0, y1, z1),
                Point3::new(x0, y1, z0),
            ],
            BlockSide::RIGHT => [
                Point3::new(x1, y0, z1),
                Point3::new(x1, y0, z0),
                Point3::new(x1, y1, z0),
                Point3::new(x1, y1, z1),
            ],
        };
        Face {
            corners,
            block_side,
        }
    }
}
