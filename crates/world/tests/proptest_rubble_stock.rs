//! Property-based tests for rubble stock mechanics
//!
//! Validates stock invariants:
//! - Totals never exceed capacity
//! - The rock lock is held exactly while the stock is non-empty
//! - Degradation debits the rule cost and credits one unit
//! - Failed operations leave the stock untouched

use proptest::prelude::*;
use stonequarry_core::RegistryKey;
use stonequarry_world::{degradation_rule, MaterialTier, RockId, RubbleCounts, RubbleStock};

fn rock(name: &str) -> RockId {
    RegistryKey::parse(name).unwrap()
}

fn tier_strategy() -> impl Strategy<Value = MaterialTier> {
    prop_oneof![
        Just(MaterialTier::Stone),
        Just(MaterialTier::Gravel),
        Just(MaterialTier::Sand),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Add { granite: bool, tier: MaterialTier, quantity: u32 },
    Remove { tier: MaterialTier, quantity: u32, batch: u32 },
    Degrade { from: MaterialTier, to: MaterialTier, split: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<bool>(), tier_strategy(), 0u32..80)
            .prop_map(|(granite, tier, quantity)| Op::Add { granite, tier, quantity }),
        (tier_strategy(), 0u32..80, 1u32..64)
            .prop_map(|(tier, quantity, batch)| Op::Remove { tier, quantity, batch }),
        (tier_strategy(), tier_strategy(), any::<bool>())
            .prop_map(|(from, to, split)| Op::Degrade { from, to, split }),
    ]
}

proptest! {
    /// Property: Any operation sequence keeps the stock within capacity
    /// and holds the lock exactly while units are stored.
    #[test]
    fn operations_preserve_invariants(
        capacity in 0u32..200,
        ops in proptest::collection::vec(op_strategy(), 0..60),
    ) {
        let mut stock = RubbleStock::new(capacity);
        for op in ops {
            match op {
                Op::Add { granite, tier, quantity } => {
                    let r = if granite { rock("game:granite") } else { rock("game:basalt") };
                    stock.try_add(&r, tier, quantity);
                }
                Op::Remove { tier, quantity, batch } => {
                    if let Some(taken) = stock.try_remove(tier, quantity, batch) {
                        prop_assert!(taken <= batch && taken <= quantity);
                    }
                }
                Op::Degrade { from, to, split } => {
                    stock.try_degrade(from, to, split);
                }
            }

            prop_assert!(stock.total() <= stock.capacity());
            prop_assert_eq!(stock.locked_rock().is_some(), !stock.is_empty());
        }
    }

    /// Property: Adding zero always fails and changes nothing
    #[test]
    fn zero_add_fails(tier in tier_strategy(), stone in 0u32..20) {
        let mut stock = RubbleStock::restore(
            100,
            Some(rock("game:granite")),
            RubbleCounts { stone, gravel: 0, sand: 0 },
        );
        let before = stock.clone();
        prop_assert!(!stock.try_add(&rock("game:granite"), tier, 0));
        prop_assert_eq!(stock, before);
    }

    /// Property: A successful degrade debits exactly the rule cost and
    /// credits exactly one unit; a failed one changes nothing.
    #[test]
    fn degrade_conserves_rule_cost(
        stone in 0u32..20,
        gravel in 0u32..20,
        sand in 0u32..20,
        from in tier_strategy(),
        to in tier_strategy(),
        split in any::<bool>(),
    ) {
        let mut stock = RubbleStock::restore(
            100,
            Some(rock("game:granite")),
            RubbleCounts { stone, gravel, sand },
        );
        let before = stock.clone();
        let applied = stock.try_degrade(from, to, split);

        match degradation_rule(from, to) {
            Some(rule) if before.count(from) >= rule.cost => {
                prop_assert!(applied);
                prop_assert_eq!(stock.count(from), before.count(from) - rule.cost);
                prop_assert_eq!(stock.total() + rule.cost, before.total() + 1);
            }
            _ => {
                prop_assert!(!applied);
                prop_assert_eq!(stock, before);
            }
        }
    }

    /// Property: A second rock is refused until the stock is emptied
    #[test]
    fn lock_refuses_other_rocks(quantity in 1u32..50, tier in tier_strategy()) {
        let mut stock = RubbleStock::new(100);
        prop_assert!(stock.try_add(&rock("game:granite"), tier, quantity));
        prop_assert!(!stock.try_add(&rock("game:andesite"), tier, 1));

        prop_assert_eq!(stock.try_remove(tier, quantity, u32::MAX), Some(quantity));
        prop_assert!(stock.try_add(&rock("game:andesite"), tier, 1));
    }
}
