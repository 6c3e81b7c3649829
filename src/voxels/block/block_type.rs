//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world together with
//! the property table the lighting engine and the mesh builder consume: opacity, light
//! emission, solidity, transparency, water classification and base color.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockTypeSize;

/// Opacity of a block that completely stops light.
pub const FULL_OPACITY: u8 = 15;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminant is the 16-bit code stored in a chunk's block array. The
/// `FromPrimitive` derive allows conversion back from stored codes.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum BlockType {
    /// Empty space. Non-solid and fully transparent.
    AIR = 0,
    STONE,
    DIRT,
    GRASS,
    SAND,
    GRAVEL,
    CLAY,
    SNOW,
    /// Frozen sea surface. Solid but lets light through like water.
    ICE,
    /// Unbreakable floor at the bottom of every column.
    BEDROCK,
    WATER,
    WOOD,
    PLANKS,
    LEAVES,
    /// Decorative foliage; rendered but not solid.
    TALL_GRASS,
    CACTUS,
    BASALT,
    COAL_ORE,
    IRON_ORE,
    GLASS,
    TORCH,
    LANTERN,
    GLOWSTONE,
    LAVA,
    FIRE,
}

impl BlockType {
    /// Every block type, in code order.
    pub const ALL: [BlockType; 25] = [
        BlockType::AIR,
        BlockType::STONE,
        BlockType::DIRT,
        BlockType::GRASS,
        BlockType::SAND,
        BlockType::GRAVEL,
        BlockType::CLAY,
        BlockType::SNOW,
        BlockType::ICE,
        BlockType::BEDROCK,
        BlockType::WATER,
        BlockType::WOOD,
        BlockType::PLANKS,
        BlockType::LEAVES,
        BlockType::TALL_GRASS,
        BlockType::CACTUS,
        BlockType::BASALT,
        BlockType::COAL_ORE,
        BlockType::IRON_ORE,
        BlockType::GLASS,
        BlockType::TORCH,
        BlockType::LANTERN,
        BlockType::GLOWSTONE,
        BlockType::LAVA,
        BlockType::FIRE,
    ];

    /// Converts a stored block code back into a `BlockType`.
    ///
    /// Unknown codes decode as `AIR` so a corrupted cell reads as empty space
    /// instead of taking down the caller.
    pub fn from_code(code: BlockTypeSize) -> Self {
        BlockType::from_u16(code).unwrap_or(BlockType::AIR)
    }

    /// The 16-bit code stored in a chunk's block array.
    pub fn code(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    pub fn is_air(self) -> bool {
        self == BlockType::AIR
    }

    pub fn is_water(self) -> bool {
        self == BlockType::WATER
    }

    /// Leaves and other plant matter that only dims light by one level.
    pub fn is_foliage(self) -> bool {
        matches!(self, BlockType::LEAVES | BlockType::TALL_GRASS)
    }

    /// Whether the block stops movement and raycasts.
    pub fn is_solid(self) -> bool {
        !matches!(
            self,
            BlockType::AIR
                | BlockType::WATER
                | BlockType::LAVA
                | BlockType::TALL_GRASS
                | BlockType::TORCH
                | BlockType::FIRE
        )
    }

    /// Whether neighboring faces can be seen through this block.
    pub fn is_transparent(self) -> bool {
        matches!(
            self,
            BlockType::AIR
                | BlockType::WATER
                | BlockType::ICE
                | BlockType::LEAVES
                | BlockType::TALL_GRASS
                | BlockType::GLASS
                | BlockType::TORCH
                | BlockType::FIRE
        )
    }

    /// Whether the block hides every face behind it.
    pub fn is_opaque(self) -> bool {
        !self.is_transparent()
    }

    /// How many light levels are lost when light enters this block.
    ///
    /// Air and see-through decorations cost nothing, water and ice cost 2,
    /// foliage costs 1 and every other block stops light entirely.
    pub fn opacity(self) -> u8 {
        match self {
            BlockType::AIR | BlockType::GLASS | BlockType::TORCH | BlockType::FIRE => 0,
            BlockType::WATER | BlockType::ICE => 2,
            _ if self.is_foliage() => 1,
            _ => FULL_OPACITY,
        }
    }

    /// The block light level this block emits.
    pub fn light_emission(self) -> u8 {
        match self {
            BlockType::TORCH => 14,
            BlockType::LANTERN | BlockType::GLOWSTONE | BlockType::LAVA | BlockType::FIRE => 15,
            _ => 0,
        }
    }

    /// Base RGBA color used by the mesh builder before light scaling.
    pub fn base_color(self) -> [f32; 4] {
        match self {
            BlockType::AIR => [0.0, 0.0, 0.0, 0.0],
            BlockType::STONE => [0.50, 0.50, 0.52, 1.0],
            BlockType::DIRT => [0.45, 0.32, 0.20, 1.0],
            BlockType::GRASS => [0.30, 0.62, 0.24, 1.0],
            BlockType::SAND => [0.86, 0.80, 0.56, 1.0],
            BlockType::GRAVEL => [0.55, 0.52, 0.50, 1.0],
            BlockType::CLAY => [0.62, 0.64, 0.70, 1.0],
            BlockType::SNOW => [0.95, 0.96, 0.98, 1.0],
            BlockType::ICE => [0.65, 0.80, 0.95, 0.8],
            BlockType::BEDROCK => [0.20, 0.20, 0.20, 1.0],
            BlockType::WATER => [0.15, 0.35, 0.75, 0.6],
            BlockType::WOOD => [0.40, 0.28, 0.15, 1.0],
            BlockType::PLANKS => [0.70, 0.55, 0.33, 1.0],
            BlockType::LEAVES => [0.20, 0.50, 0.16, 0.9],
            BlockType::TALL_GRASS => [0.35, 0.68, 0.28, 0.9],
            BlockType::CACTUS => [0.25, 0.55, 0.20, 1.0],
            BlockType::BASALT => [0.25, 0.24, 0.26, 1.0],
            BlockType::COAL_ORE => [0.30, 0.30, 0.30, 1.0],
            BlockType::IRON_ORE => [0.62, 0.52, 0.45, 1.0],
            BlockType::GLASS => [0.85, 0.92, 0.95, 0.3],
            BlockType::TORCH => [1.00, 0.85, 0.45, 1.0],
            BlockType::LANTERN => [1.00, 0.80, 0.40, 1.0],
            BlockType::GLOWSTONE => [1.00, 0.90, 0.55, 1.0],
            BlockType::LAVA => [0.95, 0.40, 0.10, 1.0],
            BlockType::FIRE => [1.00, 0.55, 0.15, 0.9],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_from_code() {
        for block_type in BlockType::ALL {
            assert_eq!(BlockType::from_code(block_type.code()), block_type);
        }
    }

    #[test]
    fn unknown_codes_decode_as_air() {
        assert_eq!(BlockType::from_code(u16::MAX), BlockType::AIR);
    }

    #[test]
    fn opacity_follows_the_registry_rules() {
        assert_eq!(BlockType::AIR.opacity(), 0);
        assert_eq!(BlockType::WATER.opacity(), 2);
        assert_eq!(BlockType::LEAVES.opacity(), 1);
        assert_eq!(BlockType::STONE.opacity(), FULL_OPACITY);
        assert_eq!(BlockType::LAVA.opacity(), FULL_OPACITY);
        for block_type in BlockType::ALL.into_iter().filter(|block| block.is_foliage()) {
            assert_eq!(block_type.opacity(), 1, "{block_type:?}");
        }
    }

    #[test]
    fn emitters() {
        assert_eq!(BlockType::TORCH.light_emission(), 14);
        for block_type in [
            BlockType::LANTERN,
            BlockType::GLOWSTONE,
            BlockType::LAVA,
            BlockType::FIRE,
        ] {
            assert_eq!(block_type.light_emission(), 15);
        }
        assert_eq!(BlockType::STONE.light_emission(), 0);
    }

    #[test]
    fn water_is_transparent_but_not_solid() {
        assert!(BlockType::WATER.is_transparent());
        assert!(!BlockType::WATER.is_solid());
        assert!(BlockType::STONE.is_opaque());
    }
}
