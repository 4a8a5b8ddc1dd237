//! World collaborators the block-entities are driven through.

use crate::plug::PlugBlock;
use stonequarry_core::{BlockPos, ItemStack, RegistryKey};

/// Read/write access to placed blocks.
pub trait BlockAccess {
    /// Code of the block at `pos`, or `None` for air.
    fn block(&self, pos: BlockPos) -> Option<RegistryKey>;

    /// Replace the block at `pos` with air without dropping anything.
    fn clear_block(&mut self, pos: BlockPos);

    /// Whether `actor` may break the block at `pos` (claims, spawn protection).
    fn can_break(&self, pos: BlockPos, actor: &str) -> bool;

    /// Plug-and-feather block at `pos`, if any.
    fn plug(&self, pos: BlockPos) -> Option<PlugBlock>;

    /// Swap the plug at `pos` to another stage variant.
    fn set_plug_stage(&mut self, pos: BlockPos, stage: u8);
}

/// Host services beyond plain block access.
pub trait QuarryWorld: BlockAccess {
    /// Whether a block type with `code` is registered.
    fn block_type_exists(&self, code: &RegistryKey) -> bool;

    /// Spawn an item entity at a world position.
    fn spawn_item(&mut self, stack: ItemStack, at: [f64; 3]);

    /// Break the block at `pos` as if mined, removing its block-entity.
    fn break_block(&mut self, pos: BlockPos);
}
