//! In-memory world used by the headless driver and tests.
//!
//! Uses BTreeMap/BTreeSet so iteration (and therefore every quarry pass) is
//! deterministic.

use crate::access::{BlockAccess, QuarryWorld};
use crate::plug::PlugBlock;
use crate::slab::{slab_drop_code, SlabSize};
use std::collections::{BTreeMap, BTreeSet};
use stonequarry_core::{BlockPos, Cuboid, ItemStack, RegistryKey};
use tracing::debug;

/// An item entity spawned into the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedItem {
    pub stack: ItemStack,
    pub at: [f64; 3],
}

/// Block grid with plugs, protected positions and registered block types.
#[derive(Debug, Default)]
pub struct SandboxWorld {
    blocks: BTreeMap<BlockPos, RegistryKey>,
    plugs: BTreeMap<BlockPos, PlugBlock>,
    protected: BTreeSet<BlockPos>,
    block_types: BTreeSet<RegistryKey>,
    spawned: Vec<SpawnedItem>,
    broken: Vec<BlockPos>,
}

impl SandboxWorld {
    /// Empty world with no registered block types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty world with every slab size registered.
    pub fn with_slab_blocks() -> Self {
        let mut world = Self::new();
        for size in [
            SlabSize::Small,
            SlabSize::Medium,
            SlabSize::Large,
            SlabSize::Huge,
            SlabSize::Giant,
        ] {
            if let Some(code) = slab_drop_code(Some(size)) {
                world.register_block_type(code);
            }
        }
        world
    }

    pub fn register_block_type(&mut self, code: RegistryKey) {
        self.block_types.insert(code);
    }

    /// Place a plain block, replacing any plug at `pos`.
    pub fn set_block(&mut self, pos: BlockPos, code: RegistryKey) {
        self.plugs.remove(&pos);
        self.blocks.insert(pos, code);
    }

    /// Fill the inclusive box between two corners with `code`.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, code: &RegistryKey) -> usize {
        let cube = Cuboid::from_corners(a, b);
        let mut placed = 0;
        for pos in cube.positions() {
            self.set_block(pos, code.clone());
            placed += 1;
        }
        placed
    }

    /// Place a plug, replacing any block at `pos`.
    pub fn place_plug(&mut self, pos: BlockPos, plug: PlugBlock) {
        self.blocks.remove(&pos);
        self.plugs.insert(pos, plug);
    }

    /// Deny every actor permission to break `pos`.
    pub fn protect(&mut self, pos: BlockPos) {
        self.protected.insert(pos);
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn spawned_items(&self) -> &[SpawnedItem] {
        &self.spawned
    }

    /// Hand every spawned item to the caller.
    pub fn take_spawned(&mut self) -> Vec<SpawnedItem> {
        std::mem::take(&mut self.spawned)
    }

    /// Positions broken through [`QuarryWorld::break_block`], oldest first.
    pub fn broken_blocks(&self) -> &[BlockPos] {
        &self.broken
    }
}

impl BlockAccess for SandboxWorld {
    fn block(&self, pos: BlockPos) -> Option<RegistryKey> {
        self.blocks.get(&pos).cloned()
    }

    fn clear_block(&mut self, pos: BlockPos) {
        self.blocks.remove(&pos);
    }

    fn can_break(&self, pos: BlockPos, _actor: &str) -> bool {
        !self.protected.contains(&pos)
    }

    fn plug(&self, pos: BlockPos) -> Option<PlugBlock> {
        self.plugs.get(&pos).copied()
    }

    fn set_plug_stage(&mut self, pos: BlockPos, stage: u8) {
        if let Some(plug) = self.plugs.get_mut(&pos) {
            plug.stage = stage.min(plug.max_stage);
        }
    }
}

impl QuarryWorld for SandboxWorld {
    fn block_type_exists(&self, code: &RegistryKey) -> bool {
        self.block_types.contains(code)
    }

    fn spawn_item(&mut self, stack: ItemStack, at: [f64; 3]) {
        debug!(code = %stack.code, count = stack.count, ?at, "spawned item");
        self.spawned.push(SpawnedItem { stack, at });
    }

    fn break_block(&mut self, pos: BlockPos) {
        self.blocks.remove(&pos);
        self.plugs.remove(&pos);
        self.broken.push(pos);
    }
}
