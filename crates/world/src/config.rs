//! Tunables shared by the rubble storage, plug networks and stone slabs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metal a plug-and-feather set is forged from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlugMetal {
    Copper,
    TinBronze,
    BismuthBronze,
    BlackBronze,
    Iron,
    MeteoricIron,
    Steel,
}

impl PlugMetal {
    pub const ALL: [PlugMetal; 7] = [
        PlugMetal::Copper,
        PlugMetal::TinBronze,
        PlugMetal::BismuthBronze,
        PlugMetal::BlackBronze,
        PlugMetal::Iron,
        PlugMetal::MeteoricIron,
        PlugMetal::Steel,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PlugMetal::Copper => "copper",
            PlugMetal::TinBronze => "tinbronze",
            PlugMetal::BismuthBronze => "bismuthbronze",
            PlugMetal::BlackBronze => "blackbronze",
            PlugMetal::Iron => "iron",
            PlugMetal::MeteoricIron => "meteoriciron",
            PlugMetal::Steel => "steel",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|metal| metal.code() == code)
    }
}

/// Largest corner-to-corner span (in blocks, per axis) a network of each
/// plug metal may enclose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlugSizes {
    pub copper: i32,
    pub tinbronze: i32,
    pub bismuthbronze: i32,
    pub blackbronze: i32,
    pub iron: i32,
    pub meteoriciron: i32,
    pub steel: i32,
}

impl Default for PlugSizes {
    fn default() -> Self {
        Self {
            copper: 4,
            tinbronze: 5,
            bismuthbronze: 5,
            blackbronze: 6,
            iron: 7,
            meteoriciron: 7,
            steel: 8,
        }
    }
}

impl PlugSizes {
    pub fn max_span(&self, metal: PlugMetal) -> i32 {
        match metal {
            PlugMetal::Copper => self.copper,
            PlugMetal::TinBronze => self.tinbronze,
            PlugMetal::BismuthBronze => self.bismuthbronze,
            PlugMetal::BlackBronze => self.blackbronze,
            PlugMetal::Iron => self.iron,
            PlugMetal::MeteoricIron => self.meteoriciron,
            PlugMetal::Steel => self.steel,
        }
    }
}

/// Span limits for plugs forged from the metals added by the "More Metals"
/// content pack. Only published to the world settings; plug blocks of these
/// metals are defined by that pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoreMetalPlugSizes {
    pub cupronickel: i32,
    pub electrum: i32,
    pub platinum: i32,
    pub chromium: i32,
    pub titanium: i32,
}

impl Default for MoreMetalPlugSizes {
    fn default() -> Self {
        Self {
            cupronickel: 5,
            electrum: 5,
            platinum: 6,
            chromium: 8,
            titanium: 9,
        }
    }
}

/// Work needed per plug stage: `(base + per_point * points) * multiplier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlugWork {
    pub base: u32,
    pub per_point: u32,
    pub multiplier: f32,
}

impl Default for PlugWork {
    fn default() -> Self {
        Self {
            base: 5,
            per_point: 2,
            multiplier: 1.0,
        }
    }
}

/// Complete mod configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    /// Total rubble units one storage crate holds.
    pub rubble_storage_max_size: u32,
    /// Largest amount taken out of a crate by one click.
    pub rubble_take_batch: u32,
    /// Balance stone-to-sand hammering between gravel and sand.
    pub degrade_split: bool,
    /// Seconds a slab tool must be held against a slab to cut a piece.
    pub slab_interaction_time: f32,
    pub plug_work: PlugWork,
    pub plug_sizes: PlugSizes,
    pub plug_sizes_more_metals: MoreMetalPlugSizes,
}

impl Default for QuarryConfig {
    fn default() -> Self {
        Self {
            rubble_storage_max_size: 512,
            rubble_take_batch: 64,
            degrade_split: true,
            slab_interaction_time: 0.8,
            plug_work: PlugWork::default(),
            plug_sizes: PlugSizes::default(),
            plug_sizes_more_metals: MoreMetalPlugSizes::default(),
        }
    }
}

impl QuarryConfig {
    /// Publish the values block definitions read at load time.
    pub fn apply_to(&self, settings: &mut WorldSettings) {
        let sizes = &self.plug_sizes;
        settings.set_int("SQ_PlugSizes_copper", i64::from(sizes.copper));
        settings.set_int("SQ_PlugSizes_tinbronze", i64::from(sizes.tinbronze));
        settings.set_int("SQ_PlugSizes_bismuthbronze", i64::from(sizes.bismuthbronze));
        settings.set_int("SQ_PlugSizes_blackbronze", i64::from(sizes.blackbronze));
        settings.set_int("SQ_PlugSizes_iron", i64::from(sizes.iron));
        settings.set_int("SQ_PlugSizes_meteoriciron", i64::from(sizes.meteoriciron));
        settings.set_int("SQ_PlugSizes_steel", i64::from(sizes.steel));

        let more = &self.plug_sizes_more_metals;
        settings.set_int("SQ_PlugSizesMoreMetals_cupronickel", i64::from(more.cupronickel));
        settings.set_int("SQ_PlugSizesMoreMetals_electrum", i64::from(more.electrum));
        settings.set_int("SQ_PlugSizesMoreMetals_platinum", i64::from(more.platinum));
        settings.set_int("SQ_PlugSizesMoreMetals_chromium", i64::from(more.chromium));
        settings.set_int("SQ_PlugSizesMoreMetals_titanium", i64::from(more.titanium));

        settings.set_int(
            "SQ_RubbleStorageMaxSize",
            i64::from(self.rubble_storage_max_size),
        );
    }
}

/// Host-side integer settings that asset patches can reference by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldSettings {
    ints: BTreeMap<String, i64>,
}

impl WorldSettings {
    pub fn set_int(&mut self, key: &str, value: i64) {
        self.ints.insert(key.to_string(), value);
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.ints.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_publishes_every_plug_size() {
        let config = QuarryConfig {
            rubble_storage_max_size: 100,
            plug_sizes_more_metals: MoreMetalPlugSizes {
                titanium: 12,
                ..MoreMetalPlugSizes::default()
            },
            ..QuarryConfig::default()
        };
        let mut settings = WorldSettings::default();
        config.apply_to(&mut settings);

        assert_eq!(settings.len(), PlugMetal::ALL.len() + 5 + 1);
        assert_eq!(settings.get_int("SQ_PlugSizesMoreMetals_titanium"), Some(12));
        assert_eq!(settings.get_int("SQ_PlugSizesMoreMetals_cupronickel"), Some(5));
        assert_eq!(settings.get_int("SQ_PlugSizesMoreMetals_electrum"), Some(5));
        assert_eq!(settings.get_int("SQ_PlugSizesMoreMetals_platinum"), Some(6));
        assert_eq!(settings.get_int("SQ_PlugSizesMoreMetals_chromium"), Some(8));
        assert_eq!(settings.get_int("SQ_RubbleStorageMaxSize"), Some(100));
        for metal in PlugMetal::ALL {
            let key = format!("SQ_PlugSizes_{}", metal.code());
            assert_eq!(
                settings.get_int(&key),
                Some(i64::from(config.plug_sizes.max_span(metal)))
            );
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: QuarryConfig =
            serde_json::from_str(r#"{"degrade_split": false, "plug_work": {"multiplier": 2.0}}"#)
                .unwrap();
        assert!(!config.degrade_split);
        assert_eq!(config.plug_work.base, 5);
        assert_eq!(config.plug_work.multiplier, 2.0);
        assert_eq!(config.rubble_storage_max_size, 512);
    }

    #[test]
    fn metal_codes_roundtrip() {
        for metal in PlugMetal::ALL {
            assert_eq!(PlugMetal::from_code(metal.code()), Some(metal));
        }
    }
}
