//! # Chunk State
//!
//! Lifecycle flags of one loaded chunk. Each flag is its own atomic so a mesh build
//! on one chunk and a generation pass on another never contend, and so the
//! orchestrator can inspect flags without taking the chunk's data lock.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::{LateralNeighbor, NeighborMask};

/// Lifecycle flags, load epoch and neighbor links of a loaded chunk.
#[derive(Debug)]
pub struct ChunkState {
    epoch: u64,
    needs_rebuild: AtomicBool,
    is_generating: AtomicBool,
    is_building: AtomicBool,
    is_generated: AtomicBool,
    neighbor_links: AtomicU8,
}

impl ChunkState {
    /// Creates the state of a freshly inserted chunk for the load identified by `epoch`.
    pub fn new(epoch: u64) -> Self {
        ChunkState {
            epoch,
            needs_rebuild: AtomicBool::new(false),
            is_generating: AtomicBool::new(false),
            is_building: AtomicBool::new(false),
            is_generated: AtomicBool::new(false),
            neighbor_links: AtomicU8::new(0),
        }
    }

    /// Identifies one load of a coordinate. A coordinate that is unloaded and loaded
    /// again gets a new epoch, so results computed for the old load can be told apart.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn mark_for_rebuild(&self) {
        self.needs_rebuild.store(true, Ordering::Release);
    }

    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild.load(Ordering::Acquire)
    }

    /// Claims the chunk for a mesh build.
    ///
    /// Succeeds only if the chunk is dirty and no build is running; on success the
    /// dirty flag is cleared so edits made during the build schedule another one.
    pub fn try_begin_build(&self) -> bool {
        if !self.needs_rebuild() {
            return false;
        }
        if self
            .is_building
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.needs_rebuild.store(false, Ordering::Release);
        true
    }

    /// Releases the build claim. A failed build leaves the chunk dirty for a retry.
    pub fn finish_build(&self, succeeded: bool) {
        if !succeeded {
            self.mark_for_rebuild();
        }
        self.is_building.store(false, Ordering::Release);
    }

    pub fn is_building(&self) -> bool {
        self.is_building.load(Ordering::Acquire)
    }

    /// Claims the chunk for generation. Fails if a generation pass is already running.
    pub fn try_begin_generation(&self) -> bool {
        self.is_generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn finish_generation(&self, succeeded: bool) {
        if succeeded {
            self.is_generated.store(true, Ordering::Release);
            self.mark_for_rebuild();
        }
        self.is_generating.store(false, Ordering::Release);
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating.load(Ordering::Acquire)
    }

    /// Whether terrain has been swapped into the chunk.
    pub fn is_generated(&self) -> bool {
        self.is_generated.load(Ordering::Acquire)
    }

    pub fn link(&self, direction: LateralNeighbor) {
        let bits = NeighborMask::EMPTY.with(direction).bits();
        self.neighbor_links.fetch_or(bits, Ordering::AcqRel);
    }

    pub fn unlink(&self, direction: LateralNeighbor) {
        let bits = NeighborMask::EMPTY.with(direction).bits();
        self.neighbor_links.fetch_and(!bits, Ordering::AcqRel);
    }

    /// Neighbors this chunk currently reads across its borders.
    pub fn links(&self) -> NeighborMask {
        NeighborMask::from_bits(self.neighbor_links.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_dirty_and_idle() {
        let state = ChunkState::new(1);
        assert!(!state.try_begin_build());

        state.mark_for_rebuild();
        assert!(state.try_begin_build());
        assert!(state.is_building());
        assert!(!state.needs_rebuild());

        state.mark_for_rebuild();
        assert!(!state.try_begin_build());

        state.finish_build(true);
        assert!(state.try_begin_build());
    }

    #[test]
    fn failed_build_stays_dirty() {
        let state = ChunkState::new(1);
        state.mark_for_rebuild();
        assert!(state.try_begin_build());
        state.finish_build(false);
        assert!(state.needs_rebuild());
        assert!(!state.is_building());
    }

    #[test]
    fn generation_claim_is_exclusive() {
        let state = ChunkState::new(7);
        assert!(state.try_begin_generation());
        assert!(!state.try_begin_generation());
        state.finish_generation(true);
        assert!(state.is_generated());
        assert!(state.needs_rebuild());
        assert_eq!(state.epoch(), 7);
    }

    #[test]
    fn links_toggle() {
        let state = ChunkState::new(0);
        state.link(LateralNeighbor::SOUTH);
        state.link(LateralNeighbor::WEST);
        state.unlink(LateralNeighbor::SOUTH);
        assert!(state.links().contains(LateralNeighbor::WEST));
        assert!(!state.links().contains(LateralNeighbor::SOUTH));
    }
}
