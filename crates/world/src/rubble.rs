//! Rubble storage crates.
//!
//! A crate holds stone, gravel and sand of a single rock type up to a fixed
//! capacity. A rubble hammer degrades the contents toward finer tiers
//! following [`DEGRADATION_RULES`].

use crate::material::{MaterialClassifier, MaterialTier, RockId};
use serde::{Deserialize, Serialize};
use stonequarry_core::{ItemStack, RegistryKey};
use tracing::debug;

/// One row of the degradation table: `cost` units of `from` become one unit
/// of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegradationRule {
    pub from: MaterialTier,
    pub to: MaterialTier,
    pub cost: u32,
}

/// All allowed degradations.
pub const DEGRADATION_RULES: &[DegradationRule] = &[
    DegradationRule {
        from: MaterialTier::Stone,
        to: MaterialTier::Gravel,
        cost: 2,
    },
    DegradationRule {
        from: MaterialTier::Stone,
        to: MaterialTier::Sand,
        cost: 2,
    },
    DegradationRule {
        from: MaterialTier::Gravel,
        to: MaterialTier::Sand,
        cost: 1,
    },
];

/// Look up the rule for a tier pair.
pub fn degradation_rule(from: MaterialTier, to: MaterialTier) -> Option<DegradationRule> {
    DEGRADATION_RULES
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
        .copied()
}

/// Per-tier unit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RubbleCounts {
    pub stone: u32,
    pub gravel: u32,
    pub sand: u32,
}

impl RubbleCounts {
    pub fn get(&self, tier: MaterialTier) -> u32 {
        match tier {
            MaterialTier::Stone => self.stone,
            MaterialTier::Gravel => self.gravel,
            MaterialTier::Sand => self.sand,
        }
    }

    fn get_mut(&mut self, tier: MaterialTier) -> &mut u32 {
        match tier {
            MaterialTier::Stone => &mut self.stone,
            MaterialTier::Gravel => &mut self.gravel,
            MaterialTier::Sand => &mut self.sand,
        }
    }

    pub fn total(&self) -> u32 {
        self.stone
            .saturating_add(self.gravel)
            .saturating_add(self.sand)
    }
}

/// Capacity-bounded rubble counters locked to one rock type.
///
/// `stone + gravel + sand <= capacity` holds after every operation, and the
/// lock is set exactly while the stock is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubbleStock {
    counts: RubbleCounts,
    locked: Option<RockId>,
    capacity: u32,
}

impl RubbleStock {
    pub fn new(capacity: u32) -> Self {
        Self {
            counts: RubbleCounts::default(),
            locked: None,
            capacity,
        }
    }

    /// Rebuild a stock from saved counters, dropping whatever exceeds
    /// `capacity` (finest tiers are dropped first).
    pub fn restore(capacity: u32, rock: Option<RockId>, counts: RubbleCounts) -> Self {
        let mut stock = Self::new(capacity);
        let Some(rock) = rock else {
            return stock;
        };
        for tier in MaterialTier::ALL {
            let quantity = counts.get(tier);
            if quantity > 0 {
                stock.try_add(&rock, tier, quantity);
            }
        }
        stock
    }

    pub fn counts(&self) -> RubbleCounts {
        self.counts
    }

    pub fn count(&self, tier: MaterialTier) -> u32 {
        self.counts.get(tier)
    }

    pub fn locked_rock(&self) -> Option<&RockId> {
        self.locked.as_ref()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn total(&self) -> u32 {
        self.counts.total()
    }

    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// `total / capacity`, or 0 for a zero-capacity crate.
    pub fn fill_ratio(&self) -> f32 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.total() as f32 / self.capacity as f32
    }

    /// Add up to `quantity` units of `tier`, returning how many were accepted.
    ///
    /// Returns `None` when nothing fits or `rock` differs from the locked rock.
    pub fn try_add_amount(
        &mut self,
        rock: &RockId,
        tier: MaterialTier,
        quantity: u32,
    ) -> Option<u32> {
        let quantity = quantity.min(self.remaining());
        if quantity == 0 {
            return None;
        }

        match &self.locked {
            Some(locked) if locked != rock => return None,
            Some(_) => {}
            None => self.locked = Some(rock.clone()),
        }

        let slot = self.counts.get_mut(tier);
        *slot = slot.saturating_add(quantity);
        Some(quantity)
    }

    pub fn try_add(&mut self, rock: &RockId, tier: MaterialTier, quantity: u32) -> bool {
        self.try_add_amount(rock, tier, quantity).is_some()
    }

    /// Take up to `requested` units (and at most `batch_limit`) of `tier`.
    pub fn try_remove(
        &mut self,
        tier: MaterialTier,
        requested: u32,
        batch_limit: u32,
    ) -> Option<u32> {
        let available = self.counts.get(tier);
        if available == 0 {
            return None;
        }

        let quantity = requested.min(available).min(batch_limit);
        if quantity == 0 {
            return None;
        }
        *self.counts.get_mut(tier) -= quantity;
        if self.is_empty() {
            self.locked = None;
        }
        Some(quantity)
    }

    /// Apply one degradation step from `from` toward `to`.
    ///
    /// With `split` set, stone aimed at sand is routed to whichever of gravel
    /// or sand keeps `sand : gravel` in line with `gravel : stone`. An empty
    /// gravel tier routes to gravel.
    pub fn try_degrade(&mut self, from: MaterialTier, to: MaterialTier, split: bool) -> bool {
        let Some(rule) = degradation_rule(from, to) else {
            return false;
        };
        let available = self.counts.get(from);
        if available < rule.cost {
            return false;
        }

        let target = if split && from == MaterialTier::Stone && to == MaterialTier::Sand {
            self.split_target()
        } else {
            to
        };

        *self.counts.get_mut(from) = available - rule.cost;
        let slot = self.counts.get_mut(target);
        *slot = slot.saturating_add(1);
        debug!(from = from.code(), to = target.code(), "rubble degraded");
        true
    }

    fn split_target(&self) -> MaterialTier {
        let RubbleCounts {
            stone,
            gravel,
            sand,
        } = self.counts;
        if gravel == 0 {
            return MaterialTier::Gravel;
        }
        // sand * (stone / gravel) < gravel, kept in integers.
        if u64::from(sand) * u64::from(stone) < u64::from(gravel) * u64::from(gravel) {
            MaterialTier::Sand
        } else {
            MaterialTier::Gravel
        }
    }
}

/// The tier button a crate is locked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageLock {
    #[default]
    None,
    Stone,
    Gravel,
    Sand,
}

impl StorageLock {
    pub fn from_tier(tier: MaterialTier) -> Self {
        match tier {
            MaterialTier::Stone => StorageLock::Stone,
            MaterialTier::Gravel => StorageLock::Gravel,
            MaterialTier::Sand => StorageLock::Sand,
        }
    }
}

/// Contents of a broken crate, carried on its item stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RubbleDrop {
    pub rock: Option<RockId>,
    pub counts: RubbleCounts,
}

impl RubbleDrop {
    /// Write the descriptor onto a crate item stack.
    pub fn write_to(&self, stack: &mut ItemStack) {
        let rock = self.rock.as_ref().map(|r| r.to_string());
        stack.set_str("type", rock.as_deref());
        stack.set_int("stone", i64::from(self.counts.stone));
        stack.set_int("gravel", i64::from(self.counts.gravel));
        stack.set_int("sand", i64::from(self.counts.sand));
    }

    /// Read a descriptor from a crate item stack; unknown or malformed values
    /// read as empty.
    pub fn read_from(stack: &ItemStack) -> Self {
        let count = |key: &str| u32::try_from(stack.get_int(key, 0).max(0)).unwrap_or(u32::MAX);
        Self {
            rock: stack
                .get_str("type")
                .and_then(|code| RegistryKey::parse(code).ok()),
            counts: RubbleCounts {
                stone: count("stone"),
                gravel: count("gravel"),
                sand: count("sand"),
            },
        }
    }
}

/// Block-entity state of a placed rubble storage crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubbleStorage {
    stock: RubbleStock,
    lock: StorageLock,
}

impl RubbleStorage {
    pub fn new(capacity: u32) -> Self {
        Self {
            stock: RubbleStock::new(capacity),
            lock: StorageLock::None,
        }
    }

    /// Crate placed from an item that carried contents.
    pub fn from_drop(drop: &RubbleDrop, capacity: u32) -> Self {
        Self {
            stock: RubbleStock::restore(capacity, drop.rock.clone(), drop.counts),
            lock: StorageLock::None,
        }
    }

    pub fn stock(&self) -> &RubbleStock {
        &self.stock
    }

    pub fn lock(&self) -> StorageLock {
        self.lock
    }

    pub fn drop_descriptor(&self) -> RubbleDrop {
        RubbleDrop {
            rock: self.stock.locked_rock().cloned(),
            counts: self.stock.counts(),
        }
    }

    /// Lock the hammer to `tier`, or unlock when `tier` is already locked.
    pub fn toggle_lock(&mut self, tier: MaterialTier) -> StorageLock {
        let requested = StorageLock::from_tier(tier);
        self.lock = if self.lock == requested {
            StorageLock::None
        } else {
            requested
        };
        self.lock
    }

    /// Take rubble out of the crate as an item stack.
    pub fn take(
        &mut self,
        tier: MaterialTier,
        quantity: u32,
        batch_limit: u32,
        classifier: &impl MaterialClassifier,
    ) -> Option<ItemStack> {
        let rock = self.stock.locked_rock()?.clone();
        let code = classifier.code_for(&rock, tier.code())?;
        let taken = self.stock.try_remove(tier, quantity, batch_limit)?;
        Some(ItemStack::new(code, taken))
    }

    /// Move up to `quantity` units from `source` into the crate.
    pub fn add_from(
        &mut self,
        source: &mut ItemStack,
        quantity: u32,
        classifier: &impl MaterialClassifier,
    ) -> bool {
        if source.is_empty() {
            return false;
        }
        let Some(found) = classifier.classify(&source.code) else {
            return false;
        };
        match self
            .stock
            .try_add_amount(&found.rock, found.tier, quantity.min(source.count))
        {
            Some(accepted) => {
                source.remove(accepted);
                true
            }
            None => false,
        }
    }

    /// Empty-handed click: pull every matching stack out of `inventory`.
    ///
    /// Once the crate holds a rock, only that rock's items are considered.
    pub fn add_all(
        &mut self,
        inventory: &mut [Option<ItemStack>],
        classifier: &impl MaterialClassifier,
    ) -> bool {
        let mut added = false;
        for slot in inventory.iter_mut() {
            if self.stock.is_full() {
                break;
            }
            let Some(stack) = slot else {
                continue;
            };
            if let Some(rock) = self.stock.locked_rock() {
                if !classifier.has_code(rock, &stack.code) {
                    continue;
                }
            }
            let count = stack.count;
            if self.add_from(stack, count, classifier) {
                added = true;
                if stack.is_empty() {
                    *slot = None;
                }
            }
        }
        added
    }

    /// One rubble hammer blow, degrading toward the locked tier.
    pub fn degrade_next(&mut self, split: bool) -> bool {
        match self.lock {
            StorageLock::None => {
                self.stock
                    .try_degrade(MaterialTier::Stone, MaterialTier::Sand, split)
                    || self
                        .stock
                        .try_degrade(MaterialTier::Gravel, MaterialTier::Sand, split)
            }
            StorageLock::Stone => false,
            StorageLock::Gravel => {
                self.stock
                    .try_degrade(MaterialTier::Stone, MaterialTier::Gravel, split)
            }
            StorageLock::Sand => {
                self.stock
                    .try_degrade(MaterialTier::Stone, MaterialTier::Sand, false)
                    || self
                        .stock
                        .try_degrade(MaterialTier::Gravel, MaterialTier::Sand, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::AllowedCodes;

    fn key(s: &str) -> RegistryKey {
        RegistryKey::parse(s).unwrap()
    }

    fn granite() -> RockId {
        key("game:granite")
    }

    fn stock_with(stone: u32, gravel: u32, sand: u32) -> RubbleStock {
        RubbleStock::restore(
            1000,
            Some(granite()),
            RubbleCounts {
                stone,
                gravel,
                sand,
            },
        )
    }

    #[test]
    fn add_clamps_to_capacity_and_locks() {
        let mut stock = RubbleStock::new(10);
        assert!(!stock.try_add(&granite(), MaterialTier::Stone, 0));
        assert_eq!(stock.locked_rock(), None);

        assert_eq!(
            stock.try_add_amount(&granite(), MaterialTier::Stone, 25),
            Some(10)
        );
        assert_eq!(stock.locked_rock(), Some(&granite()));
        assert!(stock.is_full());
        assert_eq!(stock.fill_ratio(), 1.0);
        assert!(!stock.try_add(&granite(), MaterialTier::Sand, 1));
    }

    #[test]
    fn scenario_add_lock_and_degrade() {
        let mut stock = RubbleStock::new(10);
        assert!(stock.try_add(&granite(), MaterialTier::Stone, 4));
        assert_eq!(stock.counts(), RubbleCounts { stone: 4, gravel: 0, sand: 0 });

        assert!(!stock.try_add(&key("game:andesite"), MaterialTier::Gravel, 4));

        assert!(stock.try_degrade(MaterialTier::Stone, MaterialTier::Sand, false));
        assert_eq!(stock.counts(), RubbleCounts { stone: 2, gravel: 0, sand: 1 });

        assert!(stock.try_add(&granite(), MaterialTier::Gravel, 4));
        assert_eq!(stock.counts(), RubbleCounts { stone: 2, gravel: 4, sand: 1 });
    }

    #[test]
    fn remove_clamps_and_releases_lock() {
        let mut stock = stock_with(5, 0, 0);
        assert_eq!(stock.try_remove(MaterialTier::Gravel, 3, 64), None);
        assert_eq!(stock.try_remove(MaterialTier::Stone, 3, 2), Some(2));
        assert_eq!(stock.try_remove(MaterialTier::Stone, 10, 64), Some(3));
        assert!(stock.is_empty());
        assert_eq!(stock.locked_rock(), None);
        assert!(stock.try_add(&key("game:andesite"), MaterialTier::Sand, 1));
    }

    #[test]
    fn degrade_requires_cost() {
        let mut stock = stock_with(1, 0, 0);
        let before = stock.clone();
        assert!(!stock.try_degrade(MaterialTier::Stone, MaterialTier::Gravel, true));
        assert_eq!(stock, before);

        assert!(!stock.try_degrade(MaterialTier::Sand, MaterialTier::Stone, true));
        assert!(!stock.try_degrade(MaterialTier::Gravel, MaterialTier::Sand, true));
        assert_eq!(stock, before);
    }

    #[test]
    fn gravel_to_sand_is_one_for_one() {
        let mut stock = stock_with(0, 3, 0);
        assert!(stock.try_degrade(MaterialTier::Gravel, MaterialTier::Sand, true));
        assert_eq!(stock.counts(), RubbleCounts { stone: 0, gravel: 2, sand: 1 });
    }

    #[test]
    fn split_balances_gravel_and_sand() {
        // sand * stone = 1 * 10 >= gravel^2 = 1 -> gravel
        let mut stock = stock_with(10, 1, 1);
        assert!(stock.try_degrade(MaterialTier::Stone, MaterialTier::Sand, true));
        assert_eq!(stock.counts(), RubbleCounts { stone: 8, gravel: 2, sand: 1 });

        // 0 * 10 < 16 -> sand
        let mut stock = stock_with(10, 4, 0);
        assert!(stock.try_degrade(MaterialTier::Stone, MaterialTier::Sand, true));
        assert_eq!(stock.counts(), RubbleCounts { stone: 8, gravel: 4, sand: 1 });

        // No gravel yet -> gravel
        let mut stock = stock_with(6, 0, 3);
        assert!(stock.try_degrade(MaterialTier::Stone, MaterialTier::Sand, true));
        assert_eq!(stock.counts(), RubbleCounts { stone: 4, gravel: 1, sand: 3 });

        // Without split the explicit target wins.
        let mut stock = stock_with(10, 1, 1);
        assert!(stock.try_degrade(MaterialTier::Stone, MaterialTier::Sand, false));
        assert_eq!(stock.counts(), RubbleCounts { stone: 8, gravel: 1, sand: 2 });
    }

    #[test]
    fn split_hammering_stone_yields_gravel_and_sand() {
        let mut storage = RubbleStorage::from_drop(
            &RubbleDrop {
                rock: Some(granite()),
                counts: RubbleCounts {
                    stone: 20,
                    gravel: 0,
                    sand: 0,
                },
            },
            100,
        );
        while storage.stock().count(MaterialTier::Stone) > 0 {
            assert!(storage.degrade_next(true));
        }
        assert_eq!(storage.stock().counts(), RubbleCounts { stone: 0, gravel: 5, sand: 5 });
    }

    #[test]
    fn restore_drops_overflow() {
        let stock = RubbleStock::restore(
            5,
            Some(granite()),
            RubbleCounts {
                stone: 3,
                gravel: 3,
                sand: 3,
            },
        );
        assert_eq!(stock.counts(), RubbleCounts { stone: 3, gravel: 2, sand: 0 });

        let empty = RubbleStock::restore(5, None, RubbleCounts { stone: 3, gravel: 0, sand: 0 });
        assert!(empty.is_empty());
    }

    #[test]
    fn storage_take_resolves_item_code() {
        let codes = AllowedCodes::with_rocks(&["granite"]).unwrap();
        let mut storage = RubbleStorage::new(100);
        let mut held = ItemStack::new(key("game:gravel-granite"), 10);
        assert!(storage.add_from(&mut held, 7, &codes));
        assert_eq!(held.count, 3);

        let taken = storage
            .take(MaterialTier::Gravel, 64, 5, &codes)
            .expect("gravel available");
        assert_eq!(taken.code, key("game:gravel-granite"));
        assert_eq!(taken.count, 5);
        assert!(storage.take(MaterialTier::Stone, 1, 64, &codes).is_none());
    }

    #[test]
    fn storage_rejects_unknown_items() {
        let codes = AllowedCodes::with_rocks(&["granite"]).unwrap();
        let mut storage = RubbleStorage::new(100);
        let mut held = ItemStack::new(key("game:rock-granite"), 4);
        assert!(!storage.add_from(&mut held, 4, &codes));
        assert_eq!(held.count, 4);
    }

    #[test]
    fn add_all_stops_when_full() {
        let codes = AllowedCodes::with_rocks(&["granite", "andesite"]).unwrap();
        let mut storage = RubbleStorage::new(12);
        let mut inventory = vec![
            Some(ItemStack::new(key("game:stone-granite"), 5)),
            Some(ItemStack::new(key("game:sand-andesite"), 5)),
            None,
            Some(ItemStack::new(key("game:sand-granite"), 10)),
        ];
        assert!(storage.add_all(&mut inventory, &codes));

        assert_eq!(inventory[0], None);
        assert_eq!(inventory[1].as_ref().map(|s| s.count), Some(5));
        assert_eq!(inventory[3].as_ref().map(|s| s.count), Some(3));
        assert!(storage.stock().is_full());
        assert!(!storage.add_all(&mut inventory, &codes));
    }

    #[test]
    fn add_all_only_takes_the_stored_rock() {
        let codes = AllowedCodes::with_rocks(&["granite", "andesite"]).unwrap();
        let mut storage = RubbleStorage::new(100);
        let mut held = ItemStack::new(key("game:stone-granite"), 2);
        assert!(storage.add_from(&mut held, 2, &codes));

        let mut inventory = vec![
            Some(ItemStack::new(key("game:sand-andesite"), 5)),
            Some(ItemStack::new(key("game:rock-granite"), 3)),
            Some(ItemStack::new(key("game:gravel-granite"), 4)),
        ];
        assert!(codes.has_code(&granite(), &key("game:rock-granite")));
        assert!(!codes.has_code(&granite(), &key("game:sand-andesite")));
        assert!(storage.add_all(&mut inventory, &codes));

        assert_eq!(inventory[0].as_ref().map(|s| s.count), Some(5));
        assert_eq!(inventory[1].as_ref().map(|s| s.count), Some(3));
        assert_eq!(inventory[2], None);
        assert_eq!(storage.stock().counts(), RubbleCounts { stone: 2, gravel: 4, sand: 0 });
    }

    #[test]
    fn lock_steers_the_hammer() {
        let mut storage = RubbleStorage::from_drop(
            &RubbleDrop {
                rock: Some(granite()),
                counts: RubbleCounts {
                    stone: 4,
                    gravel: 0,
                    sand: 0,
                },
            },
            100,
        );

        assert_eq!(storage.toggle_lock(MaterialTier::Stone), StorageLock::Stone);
        assert!(!storage.degrade_next(true));

        assert_eq!(storage.toggle_lock(MaterialTier::Gravel), StorageLock::Gravel);
        assert!(storage.degrade_next(true));
        assert_eq!(storage.stock().counts(), RubbleCounts { stone: 2, gravel: 1, sand: 0 });

        assert_eq!(storage.toggle_lock(MaterialTier::Sand), StorageLock::Sand);
        assert!(storage.degrade_next(true));
        assert_eq!(storage.stock().counts(), RubbleCounts { stone: 0, gravel: 1, sand: 1 });
        assert!(storage.degrade_next(true));
        assert_eq!(storage.stock().counts(), RubbleCounts { stone: 0, gravel: 0, sand: 2 });
        assert!(!storage.degrade_next(true));

        assert_eq!(storage.toggle_lock(MaterialTier::Sand), StorageLock::None);
    }

    #[test]
    fn drop_descriptor_roundtrips_through_stack() {
        let codes = AllowedCodes::with_rocks(&["granite"]).unwrap();
        let mut storage = RubbleStorage::new(50);
        let mut held = ItemStack::new(key("game:stone-granite"), 9);
        storage.add_from(&mut held, 9, &codes);
        storage.degrade_next(true);

        let mut crate_stack = ItemStack::new(key("stonequarry:rubblestorage"), 1);
        storage.drop_descriptor().write_to(&mut crate_stack);
        assert_eq!(crate_stack.get_str("type"), Some("game:granite"));

        let placed = RubbleStorage::from_drop(&RubbleDrop::read_from(&crate_stack), 50);
        assert_eq!(placed.stock(), storage.stock());
    }
}
