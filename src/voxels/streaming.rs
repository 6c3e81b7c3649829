//! # Streaming Working Sets
//!
//! Set arithmetic deciding which chunks to load and unload around a viewpoint
//! chunk. The should-be-loaded set is the Euclidean disc of `load_distance` chunks;
//! loads are ordered closest first, ties broken by coordinate so the order is stable.

use std::collections::HashSet;

use super::chunk::ChunkCoord;

/// Every chunk within `radius` chunks of `center`, closest first.
pub fn chunks_in_radius(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let reach = radius as i32;
    let limit = (radius as i64) * (radius as i64);
    let mut coords: Vec<ChunkCoord> = (-reach..=reach)
        .flat_map(|dz| (-reach..=reach).map(move |dx| ChunkCoord::new(center.x + dx, center.z + dz)))
        .filter(|coord| coord.distance_squared(center) <= limit)
        .collect();
    sort_by_distance(&mut coords, center);
    coords
}

/// Sorts closest to `center` first, ties by coordinate.
pub fn sort_by_distance(coords: &mut [ChunkCoord], center: ChunkCoord) {
    coords.sort_by_key(|coord| (coord.distance_squared(center), *coord));
}

/// The load and unload plan for one viewpoint chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSets {
    pub should_be_loaded: HashSet<ChunkCoord>,
    /// Wanted but not loaded, closest first
    pub to_load: Vec<ChunkCoord>,
    /// Loaded but no longer wanted
    pub to_unload: Vec<ChunkCoord>,
}

impl WorkingSets {
    /// Plans streaming for a viewpoint chunk.
    ///
    /// # Arguments
    /// * `center` - The chunk containing the viewpoint
    /// * `load_distance` - Radius of the loaded disc, in chunks
    /// * `loaded` - Coordinates currently present in the chunk map
    pub fn compute(center: ChunkCoord, load_distance: u32, loaded: &[ChunkCoord]) -> Self {
        let wanted = chunks_in_radius(center, load_distance);
        let loaded_set: HashSet<ChunkCoord> = loaded.iter().copied().collect();
        let should_be_loaded: HashSet<ChunkCoord> = wanted.iter().copied().collect();

        let to_load = wanted
            .into_iter()
            .filter(|coord| !loaded_set.contains(coord))
            .collect();
        let mut to_unload: Vec<ChunkCoord> = loaded
            .iter()
            .copied()
            .filter(|coord| !should_be_loaded.contains(coord))
            .collect();
        to_unload.sort();

        WorkingSets {
            should_be_loaded,
            to_load,
            to_unload,
        }
    }
}
