//! # Light Propagation
//!
//! Breadth-first flood fill of one light channel through any `LightVolume`.
//!
//! ## Propagation
//!
//! A lit cell offers each of its six neighbors `level - max(1, opacity)`, where
//! `opacity` belongs to the neighbor. The neighbor takes the offer only if it is
//! strictly brighter than what it already stores, and is then queued in turn.
//! Sunlight at the sky level is the exception: it moves straight down through cells
//! of zero opacity without losing any strength.
//!
//! ## Removal
//!
//! Removing light zeroes the cell and walks outwards. Neighbors dimmer than the
//! retracted value were lit by it and are zeroed as well; for sunlight, so is the
//! sky-level column directly below. Neighbors at least as bright are lit from
//! elsewhere and become refill seeds, and the refill runs as a normal propagation
//! once the removal wave has finished. Emitters caught by the removal wave re-seed
//! their own emission.

use std::collections::VecDeque;

use cgmath::Point3;

use crate::voxels::{
    block::{block_side::BlockSide, block_type::BlockType},
    chunk::{Chunk, MAX_LIGHT},
};

/// The two independent light channels stored per cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LightChannel {
    SUNLIGHT,
    BLOCKLIGHT,
}

impl LightChannel {
    pub const ALL: [LightChannel; 2] = [LightChannel::SUNLIGHT, LightChannel::BLOCKLIGHT];
}

/// A queued BFS item.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LightNode {
    pub position: Point3<i32>,
    /// For removal nodes, the value that was retracted. Propagation nodes re-read
    /// the stored value when they are processed.
    pub level: u8,
    pub channel: LightChannel,
}

/// Storage the propagator can read blocks from and write light into.
pub trait LightVolume {
    /// The block and stored light of a cell, or `None` if the cell lies outside the
    /// volume. Cells outside the volume are never read from or written to.
    fn cell(&mut self, position: Point3<i32>, channel: LightChannel) -> Option<(BlockType, u8)>;

    fn set_light(&mut self, position: Point3<i32>, channel: LightChannel, level: u8);
}

/// A single chunk is a volume in its own local coordinates.
impl LightVolume for Chunk {
    fn cell(&mut self, position: Point3<i32>, channel: LightChannel) -> Option<(BlockType, u8)> {
        let Point3 { x, y, z } = position;
        if !crate::voxels::chunk::in_bounds(x, y, z) {
            return None;
        }
        let level = match channel {
            LightChannel::SUNLIGHT => self.get_sunlight(x, y, z),
            LightChannel::BLOCKLIGHT => self.get_blocklight(x, y, z),
        };
        Some((self.get_block(x, y, z), level))
    }

    fn set_light(&mut self, position: Point3<i32>, channel: LightChannel, level: u8) {
        let Point3 { x, y, z } = position;
        match channel {
            LightChannel::SUNLIGHT => self.set_sunlight(x, y, z, level),
            LightChannel::BLOCKLIGHT => self.set_blocklight(x, y, z, level),
        }
    }
}

/// Light a neighbor receives from a cell at `level` through `side`.
fn attenuate(channel: LightChannel, side: BlockSide, level: u8, sky_level: u8, block: BlockType) -> u8 {
    let opacity = block.opacity();
    if channel == LightChannel::SUNLIGHT && side == BlockSide::BOTTOM && level == sky_level && opacity == 0 {
        level
    } else {
        level.saturating_sub(opacity.max(1))
    }
}

/// The two BFS queues of the lighting passes.
#[derive(Debug)]
pub struct LightPropagator {
    additions: VecDeque<LightNode>,
    removals: VecDeque<LightNode>,
    sky_level: u8,
}

impl Default for LightPropagator {
    fn default() -> Self {
        Self::new(MAX_LIGHT)
    }
}

impl LightPropagator {
    /// Creates a propagator for a sky shining at `sky_level`.
    pub fn new(sky_level: u8) -> Self {
        LightPropagator {
            additions: VecDeque::new(),
            removals: VecDeque::new(),
            sky_level: sky_level.min(MAX_LIGHT),
        }
    }

    pub fn sky_level(&self) -> u8 {
        self.sky_level
    }

    pub fn set_sky_level(&mut self, sky_level: u8) {
        self.sky_level = sky_level.min(MAX_LIGHT);
    }

    /// `true` when both queues are empty.
    pub fn is_idle(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Queues a cell to spread whatever light it stores when `run` is called.
    pub fn seed(&mut self, position: Point3<i32>, channel: LightChannel) {
        self.additions.push_back(LightNode {
            position,
            level: 0,
            channel,
        });
    }

    /// Raises a cell to at least `level` and queues it.
    pub fn add_source(
        &mut self,
        volume: &mut impl LightVolume,
        position: Point3<i32>,
        channel: LightChannel,
        level: u8,
    ) {
        let Some((_, stored)) = volume.cell(position, channel) else {
            return;
        };
        let level = level.min(MAX_LIGHT);
        if level > stored {
            volume.set_light(position, channel, level);
        }
        self.seed(position, channel);
    }

    /// Zeroes a cell and queues the light it held for removal.
    pub fn remove(&mut self, volume: &mut impl LightVolume, position: Point3<i32>, channel: LightChannel) {
        let Some((_, stored)) = volume.cell(position, channel) else {
            return;
        };
        if stored == 0 {
            return;
        }
        volume.set_light(position, channel, 0);
        self.removals.push_back(LightNode {
            position,
            level: stored,
            channel,
        });
    }

    /// Drains the removal queue, then the addition queue.
    pub fn run(&mut self, volume: &mut impl LightVolume) {
        self.process_removals(volume);
        self.process_additions(volume);
    }

    fn process_removals(&mut self, volume: &mut impl LightVolume) {
        while let Some(node) = self.removals.pop_front() {
            for side in BlockSide::all() {
                let neighbor = node.position + side.offset();
                let Some((block, stored)) = volume.cell(neighbor, node.channel) else {
                    continue;
                };
                if stored == 0 {
                    continue;
                }

                let sky_column = node.channel == LightChannel::SUNLIGHT
                    && side == BlockSide::BOTTOM
                    && node.level == self.sky_level
                    && stored == self.sky_level;

                if stored < node.level || sky_column {
                    volume.set_light(neighbor, node.channel, 0);
                    self.removals.push_back(LightNode {
                        position: neighbor,
                        level: stored,
                        channel: node.channel,
                    });

                    let emission = block.light_emission();
                    if node.channel == LightChannel::BLOCKLIGHT && emission > 0 {
                        volume.set_light(neighbor, node.channel, emission);
                        self.seed(neighbor, node.channel);
                    }
                } else {
                    self.seed(neighbor, node.channel);
                }
            }
        }
    }

    fn process_additions(&mut self, volume: &mut impl LightVolume) {
        while let Some(node) = self.additions.pop_front() {
            let Some((_, level)) = volume.cell(node.position, node.channel) else {
                continue;
            };
            if level <= 1 {
                continue;
            }

            for side in BlockSide::all() {
                let neighbor = node.position + side.offset();
                let Some((block, stored)) = volume.cell(neighbor, node.channel) else {
                    continue;
                };
                let offered = attenuate(node.channel, side, level, self.sky_level, block);
                if offered > stored {
                    volume.set_light(neighbor, node.channel, offered);
                    self.seed(neighbor, node.channel);
                }
            }
        }
    }
}
