use std::collections::HashSet;

use voxel_world::voxels::{
    block::block_type::BlockType,
    chunk::{block_index, Chunk, ChunkCoord, BLOCKS_PER_CHUNK, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH, MAX_LIGHT},
};

#[test]
fn every_cell_round_trips() {
    let mut chunk = Chunk::new(ChunkCoord::new(4, -7));
    let types = BlockType::ALL;
    for y in 0..CHUNK_HEIGHT as i32 {
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                let block = types[((x + 3 * z + 7 * y) as usize) % types.len()];
                chunk.set_block(x, y, z, block);
            }
        }
    }
    for y in 0..CHUNK_HEIGHT as i32 {
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                let expected = types[((x + 3 * z + 7 * y) as usize) % types.len()];
                assert_eq!(chunk.get_block(x, y, z), expected, "({x}, {y}, {z})");
            }
        }
    }
}

#[test]
fn every_block_type_round_trips() {
    let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
    for block in BlockType::ALL {
        for (x, y, z) in [(0, 0, 0), (15, 255, 15), (7, 128, 3)] {
            chunk.set_block(x, y, z, block);
            assert_eq!(chunk.get_block(x, y, z), block);
        }
    }
}

#[test]
fn index_is_a_bijection() {
    let mut seen = HashSet::with_capacity(BLOCKS_PER_CHUNK);
    for y in 0..CHUNK_HEIGHT {
        for z in 0..CHUNK_DEPTH {
            for x in 0..CHUNK_WIDTH {
                let index = block_index(x, y, z);
                assert!(index < BLOCKS_PER_CHUNK);
                assert!(seen.insert(index));
            }
        }
    }
    assert_eq!(seen.len(), BLOCKS_PER_CHUNK);
    assert_eq!(block_index(1, 2, 3), 2 * 256 + 3 * 16 + 1);
}

#[test]
fn out_of_range_access_has_defaults() {
    let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
    assert!(chunk.set_block(16, 0, 0, BlockType::STONE).is_none());
    assert!(chunk.set_block(0, -1, 0, BlockType::STONE).is_none());
    assert_eq!(chunk.get_block(0, 256, 0), BlockType::AIR);
    assert_eq!(chunk.get_light_level(-1, 10, 0), MAX_LIGHT);
    assert!(chunk.is_empty());
}
