//! Plug-and-feather quarrying.
//!
//! Plugs are hammered into rock around a region. Each plug's block-entity
//! keeps the ordered list of every plug in its network. Striking a plug adds
//! work; every time the work exceeds the per-stage threshold all member plugs
//! advance one stage. Once every plug sits at its last stage the next strike
//! splits the enclosed rock out as a single stone slab.

use crate::access::{BlockAccess, QuarryWorld};
use crate::config::{PlugMetal, PlugSizes, PlugWork};
use crate::material::{MaterialClassifier, RockId};
use crate::slab::{slab_drop_code, SlabContents, SlabSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stonequarry_core::{BlockPos, Cuboid, Facing, ItemStack};
use tracing::{debug, info, warn};

/// Direction a plug is driven into the rock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlugOrientation {
    Down,
    Up,
    Horizontal(Facing),
}

impl PlugOrientation {
    /// Facing pointing from the plug into the region it splits.
    pub fn inward(self) -> Facing {
        match self {
            PlugOrientation::Down => Facing::Down,
            PlugOrientation::Up => Facing::Up,
            PlugOrientation::Horizontal(facing) => facing,
        }
    }
}

/// Block state of a placed plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlugBlock {
    pub metal: PlugMetal,
    pub orientation: PlugOrientation,
    pub stage: u8,
    pub max_stage: u8,
}

impl PlugBlock {
    pub fn new(metal: PlugMetal, orientation: PlugOrientation, max_stage: u8) -> Self {
        Self {
            metal,
            orientation,
            stage: 0,
            max_stage,
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage == self.max_stage
    }
}

/// Rock split out of a network's region.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlabYield {
    pub size: Option<SlabSize>,
    pub contents: BTreeMap<RockId, u32>,
}

impl SlabYield {
    pub fn total(&self) -> u32 {
        self.contents
            .values()
            .fold(0u32, |acc, count| acc.saturating_add(*count))
    }
}

/// Outcome of breaking a finished network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakOutcome {
    pub quarried: SlabYield,
    /// The spawned slab, or `None` when no slab block exists for the size and
    /// the quarried rock was lost.
    pub dropped: Option<ItemStack>,
}

/// Outcome of striking a plug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlugStrike {
    /// The plug is not part of a network.
    Inactive,
    /// Work was added without finishing a stage.
    Worked,
    /// Every member plug advanced one stage.
    StageAdvanced { complete: bool },
    /// The network was complete and has been broken.
    Broken(BreakOutcome),
}

/// Block-entity state of one plug in a network.
///
/// The first two points are the opposite corners of the network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlugNetwork {
    points: Vec<BlockPos>,
    stage_work: u32,
}

impl PlugNetwork {
    /// A plug that belongs to no network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Network over `points` without any size check.
    pub fn with_points(points: Vec<BlockPos>) -> Self {
        Self {
            points,
            stage_work: 0,
        }
    }

    /// Link `points` into a network if its corners fit the span allowed for
    /// `metal`.
    pub fn form(points: Vec<BlockPos>, metal: PlugMetal, sizes: &PlugSizes) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let (a, b) = (points[0], points[1]);
        let max_span = i64::from(sizes.max_span(metal));
        let spans = [
            (i64::from(a.x) - i64::from(b.x)).abs(),
            (i64::from(a.y) - i64::from(b.y)).abs(),
            (i64::from(a.z) - i64::from(b.z)).abs(),
        ];
        if spans.iter().any(|span| *span > max_span) {
            debug!(?spans, max_span, metal = metal.code(), "plug network too large");
            return None;
        }
        Some(Self::with_points(points))
    }

    pub fn points(&self) -> &[BlockPos] {
        &self.points
    }

    pub fn stage_work(&self) -> u32 {
        self.stage_work
    }

    pub fn is_active(&self) -> bool {
        self.points.len() >= 2
    }

    /// Forget the network after its structure was broken.
    pub fn reset(&mut self) {
        self.points.clear();
        self.stage_work = 0;
    }

    pub fn max_work_per_stage(&self, work: &PlugWork) -> u32 {
        let points = u32::try_from(self.points.len()).unwrap_or(u32::MAX);
        let needed = work
            .base
            .saturating_add(work.per_point.saturating_mul(points));
        (needed as f32 * work.multiplier) as u32
    }

    /// Add `work_delta` to the stage work. Returns true when a stage completed;
    /// the excess carries over into the next stage.
    pub fn register_impact(&mut self, work_delta: u32, work: &PlugWork) -> bool {
        if !self.is_active() {
            return false;
        }
        self.stage_work = self.stage_work.saturating_add(work_delta);
        let threshold = self.max_work_per_stage(work);
        if self.stage_work > threshold {
            self.stage_work -= threshold;
            return true;
        }
        false
    }

    /// Move every member plug one stage on, stopping at its last stage.
    pub fn advance_stages(&self, world: &mut impl BlockAccess) {
        for pos in &self.points {
            if let Some(plug) = world.plug(*pos) {
                if plug.stage < plug.max_stage {
                    world.set_plug_stage(*pos, plug.stage + 1);
                }
            }
        }
    }

    /// True when every member plug still in the world is at its last stage.
    pub fn is_complete(&self, world: &impl BlockAccess) -> bool {
        self.is_active()
            && self
                .points
                .iter()
                .filter_map(|pos| world.plug(*pos))
                .all(|plug| plug.is_done())
    }

    /// Region enclosed by the network, or `None` when inactive.
    pub fn compute_region(&self, world: &impl BlockAccess) -> Option<Cuboid> {
        if !self.is_active() {
            return None;
        }
        let mut cube = Cuboid::from_corners(self.points[0], self.points[1]);
        cube.grow_by(-1, -1, -1);

        for pos in &self.points {
            if let Some(plug) = world.plug(*pos) {
                cube.include(pos.offset(plug.orientation.inward()));
            }
        }
        Some(cube)
    }

    /// Every position inside the region, for previews.
    pub fn positions_inside(&self, world: &impl BlockAccess) -> Vec<BlockPos> {
        self.compute_region(world)
            .map(|cube| cube.positions().collect())
            .unwrap_or_default()
    }

    /// Strike this plug (at `own_pos`) with a tool worth `impact` work.
    pub fn strike<W, C>(
        &mut self,
        own_pos: BlockPos,
        impact: u32,
        world: &mut W,
        classifier: &C,
        actor: &str,
        work: &PlugWork,
    ) -> PlugStrike
    where
        W: QuarryWorld,
        C: MaterialClassifier,
    {
        if !self.is_active() {
            return PlugStrike::Inactive;
        }
        if self.is_complete(world) {
            return PlugStrike::Broken(self.break_all(own_pos, world, classifier, actor));
        }
        if self.register_impact(impact, work) {
            self.advance_stages(world);
            let complete = self.is_complete(world);
            debug!(%own_pos, complete, carry = self.stage_work, "plug network advanced a stage");
            return PlugStrike::StageAdvanced { complete };
        }
        PlugStrike::Worked
    }

    /// Split the enclosed rock out as a slab and break this plug.
    ///
    /// When no slab block exists for the quarried size the rock is lost; the
    /// plug still breaks.
    pub fn break_all<W, C>(
        &mut self,
        own_pos: BlockPos,
        world: &mut W,
        classifier: &C,
        actor: &str,
    ) -> BreakOutcome
    where
        W: QuarryWorld,
        C: MaterialClassifier,
    {
        let region = self.compute_region(world);
        let quarried = match region {
            Some(region) => finalize(&region, world, classifier, actor),
            None => SlabYield::default(),
        };

        let drop_code = slab_drop_code(quarried.size);
        let dropped = match drop_code {
            Some(code) if world.block_type_exists(&code) => {
                let mut stack = ItemStack::new(code, 1);
                SlabContents::from_counts(&quarried.contents).write_to(&mut stack);
                let center = region.map(|r| r.center()).unwrap_or(own_pos);
                let at = [
                    f64::from(center.x) + 0.5,
                    f64::from(center.y) + 0.5,
                    f64::from(center.z) + 0.5,
                ];
                world.spawn_item(stack.clone(), at);
                Some(stack)
            }
            code => {
                warn!(
                    code = ?code,
                    lost = quarried.total(),
                    "unknown drop item, quarried rock discarded"
                );
                None
            }
        };

        info!(
            %own_pos,
            blocks = quarried.total(),
            size = quarried.size.map(SlabSize::code),
            "plug network broken"
        );
        world.break_block(own_pos);
        self.reset();

        BreakOutcome { quarried, dropped }
    }
}

/// Quarry every rock block inside `region` that `actor` may break.
///
/// Eligible blocks are cleared and counted per rock; the total picks the slab
/// size.
pub fn finalize<W, C>(region: &Cuboid, world: &mut W, classifier: &C, actor: &str) -> SlabYield
where
    W: BlockAccess,
    C: MaterialClassifier,
{
    let mut contents: BTreeMap<RockId, u32> = BTreeMap::new();
    for pos in region.positions() {
        let Some(block) = world.block(pos) else {
            continue;
        };
        let Some(rock) = classifier.rock_of_block(&block) else {
            continue;
        };
        if !world.can_break(pos, actor) {
            continue;
        }
        world.clear_block(pos);
        *contents.entry(rock).or_insert(0) += 1;
    }

    let total = contents
        .values()
        .fold(0u32, |acc, count| acc.saturating_add(*count));
    SlabYield {
        size: SlabSize::from_count(total),
        contents,
    }
}
