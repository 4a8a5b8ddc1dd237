//! Stone slabs: the quarried block a finished plug network drops.
//!
//! A slab carries counts of one or more rocks. Holding a slab tool against a
//! placed slab for [`QuarryConfig::slab_interaction_time`] seconds cuts a piece
//! off the currently selected rock; the slab breaks once empty.

use crate::config::QuarryConfig;
use crate::material::{MaterialClassifier, RockId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stonequarry_core::registry::MOD_NAMESPACE;
use stonequarry_core::{ItemStack, RegistryKey};

/// Size tag of a quarried slab, chosen by the number of rock blocks it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlabSize {
    Small,
    Medium,
    Large,
    Huge,
    Giant,
}

impl SlabSize {
    /// Minimum block count per size, largest first.
    pub const THRESHOLDS: [(u32, SlabSize); 4] = [
        (168, SlabSize::Giant),
        (126, SlabSize::Huge),
        (84, SlabSize::Large),
        (42, SlabSize::Medium),
    ];

    /// Size for `count` quarried blocks; `None` when nothing was quarried.
    pub fn from_count(count: u32) -> Option<Self> {
        if count == 0 {
            return None;
        }
        Self::THRESHOLDS
            .iter()
            .find(|(min, _)| count >= *min)
            .map(|(_, size)| *size)
            .or(Some(SlabSize::Small))
    }

    pub fn code(self) -> &'static str {
        match self {
            SlabSize::Small => "small",
            SlabSize::Medium => "medium",
            SlabSize::Large => "large",
            SlabSize::Huge => "huge",
            SlabSize::Giant => "giant",
        }
    }
}

/// Block code of the slab dropped for `size`.
///
/// A missing size yields a code no block is registered under.
pub fn slab_drop_code(size: Option<SlabSize>) -> Option<RegistryKey> {
    let size = size.map(SlabSize::code).unwrap_or_default();
    RegistryKey::new(MOD_NAMESPACE, &format!("stoneslab-andesite-{size}-north")).ok()
}

/// What a slab tool cuts off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlabDropType {
    Rock,
    RockPolished,
    Stone,
    StoneBrick,
}

impl SlabDropType {
    /// Classifier variant name.
    pub fn code(self) -> &'static str {
        match self {
            SlabDropType::Rock => "rock",
            SlabDropType::RockPolished => "rockpolished",
            SlabDropType::Stone => "stone",
            SlabDropType::StoneBrick => "stonebrick",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        [
            SlabDropType::Rock,
            SlabDropType::RockPolished,
            SlabDropType::Stone,
            SlabDropType::StoneBrick,
        ]
        .into_iter()
        .find(|t| t.code() == code)
    }
}

/// A held slab tool (chisel, hammer, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabTool {
    pub drop_type: SlabDropType,
    /// Units taken per completed cut.
    pub quantity: u32,
}

/// Result of releasing a slab tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlabCut {
    /// Released early, empty slab, or the rock has no item of that type.
    Nothing,
    /// A piece was cut; the slab still holds rock.
    Piece(ItemStack),
    /// The last piece was cut; the slab block should break.
    LastPiece(ItemStack),
}

/// Rock contents of a slab block-entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlabContents {
    stacks: Vec<(RockId, u32)>,
    current: usize,
}

impl SlabContents {
    /// Contents of a freshly quarried slab.
    pub fn from_counts(counts: &BTreeMap<RockId, u32>) -> Self {
        Self {
            stacks: counts
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(rock, count)| (rock.clone(), *count))
                .collect(),
            current: 0,
        }
    }

    pub fn stacks(&self) -> &[(RockId, u32)] {
        &self.stacks
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn total(&self) -> u32 {
        self.stacks
            .iter()
            .fold(0u32, |acc, (_, count)| acc.saturating_add(*count))
    }

    pub fn current_rock(&self) -> Option<&RockId> {
        self.stacks.get(self.current).map(|(rock, _)| rock)
    }

    /// Select the next rock, wrapping around.
    pub fn next_slot(&mut self) {
        if self.stacks.is_empty() {
            self.current = 0;
        } else {
            self.current = (self.current + 1) % self.stacks.len();
        }
    }

    /// Creative: add a held stack of raw rock.
    pub fn try_add_stack(&mut self, stack: &ItemStack, classifier: &impl MaterialClassifier) -> bool {
        if stack.is_empty() {
            return false;
        }
        let Some(rock) = classifier.rock_of_block(&stack.code) else {
            return false;
        };
        match self.stacks.iter_mut().find(|(r, _)| *r == rock) {
            Some((_, count)) => *count = count.saturating_add(stack.count),
            None => self.stacks.push((rock, stack.count)),
        }
        true
    }

    /// Creative: remove every unit of the held stack's rock.
    pub fn try_remove_stack(
        &mut self,
        stack: &ItemStack,
        classifier: &impl MaterialClassifier,
    ) -> bool {
        let Some(rock) = classifier.rock_of_block(&stack.code) else {
            return false;
        };
        let Some(index) = self.stacks.iter().position(|(r, _)| *r == rock) else {
            return false;
        };
        self.stacks.remove(index);
        self.clamp_current();
        true
    }

    /// Cut up to `quantity` units of the selected rock as `drop_type` items.
    pub fn take(
        &mut self,
        drop_type: SlabDropType,
        quantity: u32,
        classifier: &impl MaterialClassifier,
    ) -> Option<ItemStack> {
        if quantity == 0 {
            return None;
        }
        let (rock, count) = self.stacks.get_mut(self.current)?;
        let code = classifier.code_for(rock, drop_type.code())?;
        let taken = quantity.min(*count);
        *count -= taken;
        if *count == 0 {
            self.stacks.remove(self.current);
            self.clamp_current();
        }
        Some(ItemStack::new(code, taken))
    }

    /// Whether a hold that has lasted `seconds_used` should continue.
    pub fn interact_step(seconds_used: f32, config: &QuarryConfig) -> bool {
        seconds_used < config.slab_interaction_time
    }

    /// Release a held slab tool after `seconds_used` seconds.
    pub fn interact_stop(
        &mut self,
        seconds_used: f32,
        tool: Option<&SlabTool>,
        config: &QuarryConfig,
        classifier: &impl MaterialClassifier,
    ) -> SlabCut {
        let Some(tool) = tool else {
            return SlabCut::Nothing;
        };
        if seconds_used < config.slab_interaction_time || self.is_empty() {
            return SlabCut::Nothing;
        }
        match self.take(tool.drop_type, tool.quantity, classifier) {
            Some(piece) if self.is_empty() => SlabCut::LastPiece(piece),
            Some(piece) => SlabCut::Piece(piece),
            None => SlabCut::Nothing,
        }
    }

    /// Write the contents onto a slab item stack.
    pub fn write_to(&self, stack: &mut ItemStack) {
        stack.set_int("qslots", self.stacks.len() as i64);
        stack.set_int("current", self.current as i64);
        for (i, (rock, count)) in self.stacks.iter().enumerate() {
            stack.set_str(&format!("rock{i}"), Some(&rock.to_string()));
            stack.set_int(&format!("count{i}"), i64::from(*count));
        }
    }

    /// Read contents from a slab item stack, skipping malformed entries.
    pub fn read_from(stack: &ItemStack) -> Self {
        let slots = stack.get_int("qslots", 0).max(0);
        let mut stacks = Vec::new();
        for i in 0..slots {
            let rock = stack
                .get_str(&format!("rock{i}"))
                .and_then(|code| RegistryKey::parse(code).ok());
            let count = u32::try_from(stack.get_int(&format!("count{i}"), 0)).unwrap_or(0);
            if let Some(rock) = rock {
                if count > 0 {
                    stacks.push((rock, count));
                }
            }
        }
        let mut contents = Self {
            stacks,
            current: usize::try_from(stack.get_int("current", 0)).unwrap_or(0),
        };
        contents.clamp_current();
        contents
    }

    fn clamp_current(&mut self) {
        if self.current >= self.stacks.len() {
            self.current = 0;
        }
    }
}
