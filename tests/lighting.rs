use cgmath::Point3;
use voxel_world::voxels::{
    block::block_type::BlockType,
    chunk::{Chunk, ChunkCoord, CHUNK_DEPTH, CHUNK_HEIGHT, CHUNK_WIDTH, MAX_LIGHT},
    chunk_map::ChunkMap,
    lighting::{light_new_chunk, sunlight_for_time, LightingEngine, DAY_LIGHT, NIGHT_LIGHT},
};

fn generated(map: &ChunkMap, chunk: Chunk) {
    let coord = chunk.position();
    let entry = map.insert_if_absent(coord, 1).expect("fresh coordinate");
    *entry.chunk.get_mut() = chunk;
    assert!(entry.state.try_begin_generation());
    entry.state.finish_generation(true);
}

fn all_levels(chunk: &Chunk) -> impl Iterator<Item = (u8, u8)> + '_ {
    (0..CHUNK_HEIGHT as i32).flat_map(move |y| {
        (0..CHUNK_DEPTH as i32).flat_map(move |z| {
            (0..CHUNK_WIDTH as i32).map(move |x| (chunk.get_sunlight(x, y, z), chunk.get_blocklight(x, y, z)))
        })
    })
}

/// A hollow stone box with a 3x3x3 interior centered on `center`.
fn sealed_room(chunk: &mut Chunk, center: Point3<i32>) {
    for y in -2i32..=2 {
        for z in -2i32..=2 {
            for x in -2i32..=2 {
                let shell = x.abs() == 2 || y.abs() == 2 || z.abs() == 2;
                let block = if shell { BlockType::STONE } else { BlockType::AIR };
                chunk.set_block(center.x + x, center.y + y, center.z + z, block);
            }
        }
    }
}

#[test]
fn time_of_day_drives_the_sky_level() {
    assert_eq!(sunlight_for_time(12.0), DAY_LIGHT);
    assert_eq!(sunlight_for_time(0.0), NIGHT_LIGHT);
    assert_eq!(sunlight_for_time(6.0), 10);
    assert_eq!(sunlight_for_time(36.0), DAY_LIGHT);
}

#[test]
fn sunlight_falls_monotonically_under_terrain() {
    let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
    for y in 0..=90 {
        for z in 0..CHUNK_DEPTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                chunk.set_block(x, y, z, BlockType::STONE);
            }
        }
    }
    chunk.set_block(4, 120, 4, BlockType::STONE);
    chunk.set_block(9, 95, 2, BlockType::LEAVES);
    light_new_chunk(&mut chunk, 13);

    for z in 0..CHUNK_DEPTH as i32 {
        for x in 0..CHUNK_WIDTH as i32 {
            assert_eq!(chunk.get_sunlight(x, 255, z), 13);
            let mut above = chunk.get_sunlight(x, 90, z);
            for y in (0..90).rev() {
                let level = chunk.get_sunlight(x, y, z);
                assert!(level <= above, "sunlight rose at ({x}, {y}, {z})");
                above = level;
            }
            assert_eq!(chunk.get_sunlight(x, 50, z), 0);
        }
    }
    assert_eq!(chunk.get_sunlight(0, 200, 0), 13);
}

#[test]
fn light_stays_in_range() {
    let map = ChunkMap::new();
    let coord = ChunkCoord::new(1, 1);
    let mut chunk = Chunk::new(coord);
    for (x, z) in [(1, 1), (2, 2), (14, 14)] {
        chunk.set_block(x, 40, z, BlockType::LAVA);
        chunk.set_block(x, 41, z, BlockType::GLOWSTONE);
    }
    light_new_chunk(&mut chunk, 15);
    generated(&map, chunk);

    let entry = map.get(coord).expect("loaded");
    entry.chunk.get_mut().set_block(2, 41, 2, BlockType::AIR);
    entry.chunk.get_mut().set_block(3, 41, 3, BlockType::TORCH);

    let mut engine = LightingEngine::new(12.0);
    let origin = coord.origin();
    engine.queue_block_change(coord, Point3::new(origin.x + 2, 41, origin.z + 2), BlockType::GLOWSTONE, BlockType::AIR);
    engine.queue_block_change(coord, Point3::new(origin.x + 3, 41, origin.z + 3), BlockType::AIR, BlockType::TORCH);
    engine.update(&map);

    let chunk = entry.chunk.get();
    assert!(all_levels(&chunk).all(|(sun, block)| sun <= MAX_LIGHT && block <= MAX_LIGHT));
}

#[test]
fn block_light_propagation_is_idempotent() {
    let map = ChunkMap::new();
    let coord = ChunkCoord::new(0, 0);
    let mut chunk = Chunk::new(coord);
    chunk.set_block(8, 30, 8, BlockType::TORCH);
    chunk.set_block(2, 60, 12, BlockType::GLOWSTONE);
    light_new_chunk(&mut chunk, 15);
    generated(&map, chunk);

    let mut engine = LightingEngine::new(12.0);
    engine.propagate_block_light(&map, coord);
    let first: Vec<u8> = map.get(coord).expect("loaded").chunk.get().light_data().to_vec();
    engine.propagate_block_light(&map, coord);
    let second: Vec<u8> = map.get(coord).expect("loaded").chunk.get().light_data().to_vec();
    assert_eq!(first, second);
}

#[test]
fn torch_in_a_sealed_room_leaves_no_trace() {
    let map = ChunkMap::new();
    let coord = ChunkCoord::new(0, 0);
    let center = Point3::new(8, 180, 8);
    let mut chunk = Chunk::new(coord);
    sealed_room(&mut chunk, center);
    light_new_chunk(&mut chunk, 15);
    generated(&map, chunk);

    let interior = |map: &ChunkMap| -> Vec<(u8, u8)> {
        let entry = map.get(coord).expect("loaded");
        let chunk = entry.chunk.get();
        let mut levels = Vec::new();
        for y in -1..=1 {
            for z in -1..=1 {
                for x in -1..=1 {
                    let (x, y, z) = (center.x + x, center.y + y, center.z + z);
                    levels.push((chunk.get_sunlight(x, y, z), chunk.get_blocklight(x, y, z)));
                }
            }
        }
        levels
    };
    assert!(interior(&map).iter().all(|&levels| levels == (0, 0)));

    let mut engine = LightingEngine::new(12.0);
    let entry = map.get(coord).expect("loaded");
    entry.chunk.get_mut().set_block(center.x, center.y, center.z, BlockType::TORCH);
    engine.queue_block_change(coord, center, BlockType::AIR, BlockType::TORCH);
    engine.update(&map);
    assert_eq!(entry.chunk.get().get_blocklight(center.x, center.y, center.z), 14);
    assert_eq!(entry.chunk.get().get_blocklight(center.x + 1, center.y, center.z), 13);

    entry.chunk.get_mut().set_block(center.x, center.y, center.z, BlockType::AIR);
    engine.queue_block_change(coord, center, BlockType::TORCH, BlockType::AIR);
    engine.update(&map);
    assert!(interior(&map).iter().all(|&levels| levels == (0, 0)));
}
