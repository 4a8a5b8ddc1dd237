//! Rock identities, rubble tiers and the code tables that classify blocks and
//! items into them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use stonequarry_core::{RegistryKey, RegistryKeyError};
use thiserror::Error;

/// Identity of a rock type (`game:granite`).
pub type RockId = RegistryKey;

/// Variant name of the raw rock block a quarry breaks.
pub const ROCK_BLOCK_VARIANT: &str = "rock";

/// Rubble grade, ordered by coarseness (`Stone > Gravel > Sand`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialTier {
    Sand,
    Gravel,
    Stone,
}

impl MaterialTier {
    /// Tiers from coarsest to finest.
    pub const ALL: [MaterialTier; 3] = [MaterialTier::Stone, MaterialTier::Gravel, MaterialTier::Sand];

    pub fn code(self) -> &'static str {
        match self {
            MaterialTier::Stone => "stone",
            MaterialTier::Gravel => "gravel",
            MaterialTier::Sand => "sand",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.code() == code)
    }
}

/// Result of classifying a rubble item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub tier: MaterialTier,
    pub rock: RockId,
}

/// Maps block and item codes onto rock identities.
///
/// Supplied by the host; the accumulators never look codes up on their own.
pub trait MaterialClassifier {
    /// Resolve a rubble item code (`game:gravel-granite`) to its tier and rock.
    fn classify(&self, code: &RegistryKey) -> Option<Classification>;

    /// Resolve a placed block to the rock it is quarried as, or `None` when the
    /// block is not quarryable rock.
    fn rock_of_block(&self, code: &RegistryKey) -> Option<RockId>;

    /// Code of the `variant` item (`stone`, `rockpolished`, ...) of `rock`.
    fn code_for(&self, rock: &RockId, variant: &str) -> Option<RegistryKey>;

    /// Whether `code` is one of `rock`'s items.
    fn has_code(&self, rock: &RockId, code: &RegistryKey) -> bool {
        self.classify(code).is_some_and(|found| &found.rock == rock)
    }
}

/// Errors raised while building an [`AllowedCodes`] table.
#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("allowed codes list no rocks")]
    NoRocks,
    #[error("invalid rock name {name:?}: {source}")]
    InvalidRock {
        name: String,
        #[source]
        source: RegistryKeyError,
    },
    #[error("variant {variant:?} expands to an invalid code {code:?}: {source}")]
    InvalidCode {
        variant: String,
        code: String,
        #[source]
        source: RegistryKeyError,
    },
    #[error("failed to parse allowed codes: {0}")]
    Json(#[from] serde_json::Error),
}

/// Authoring form of an [`AllowedCodes`] table.
///
/// Variant templates contain a `{rock}` placeholder replaced by each rock's
/// path, e.g. `"gravel": "game:gravel-{rock}"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedCodesDef {
    pub rocks: Vec<String>,
    #[serde(default = "default_variants")]
    pub variants: BTreeMap<String, String>,
}

fn default_variants() -> BTreeMap<String, String> {
    [
        ("stone", "game:stone-{rock}"),
        ("gravel", "game:gravel-{rock}"),
        ("sand", "game:sand-{rock}"),
        (ROCK_BLOCK_VARIANT, "game:rock-{rock}"),
        ("rockpolished", "game:rockpolished-{rock}"),
        ("stonebrick", "game:stonebrick-{rock}"),
    ]
    .into_iter()
    .map(|(variant, template)| (variant.to_string(), template.to_string()))
    .collect()
}

/// Table-driven [`MaterialClassifier`].
#[derive(Debug, Clone, Default)]
pub struct AllowedCodes {
    rocks: BTreeSet<RockId>,
    codes: BTreeMap<(RockId, String), RegistryKey>,
    reverse: BTreeMap<RegistryKey, (String, RockId)>,
}

impl AllowedCodes {
    /// Build a table for `rocks` using the default variant templates.
    pub fn with_rocks<S: AsRef<str>>(rocks: &[S]) -> Result<Self, MaterialError> {
        Self::from_def(AllowedCodesDef {
            rocks: rocks.iter().map(|r| r.as_ref().to_string()).collect(),
            variants: default_variants(),
        })
    }

    /// Parse a table from its JSON authoring form.
    pub fn from_json(json: &str) -> Result<Self, MaterialError> {
        let def: AllowedCodesDef = serde_json::from_str(json)?;
        Self::from_def(def)
    }

    pub fn from_def(def: AllowedCodesDef) -> Result<Self, MaterialError> {
        if def.rocks.is_empty() {
            return Err(MaterialError::NoRocks);
        }

        let mut table = Self::default();
        for name in &def.rocks {
            let rock = RegistryKey::parse(name).map_err(|source| MaterialError::InvalidRock {
                name: name.clone(),
                source,
            })?;

            for (variant, template) in &def.variants {
                let expanded = template.replace("{rock}", rock.path());
                let code =
                    RegistryKey::parse(&expanded).map_err(|source| MaterialError::InvalidCode {
                        variant: variant.clone(),
                        code: expanded.clone(),
                        source,
                    })?;
                table
                    .reverse
                    .insert(code.clone(), (variant.clone(), rock.clone()));
                table.codes.insert((rock.clone(), variant.clone()), code);
            }
            table.rocks.insert(rock);
        }

        Ok(table)
    }

    /// Known rocks in code order.
    pub fn rocks(&self) -> impl Iterator<Item = &RockId> {
        self.rocks.iter()
    }
}

impl MaterialClassifier for AllowedCodes {
    fn classify(&self, code: &RegistryKey) -> Option<Classification> {
        let (variant, rock) = self.reverse.get(code)?;
        let tier = MaterialTier::from_code(variant)?;
        Some(Classification {
            tier,
            rock: rock.clone(),
        })
    }

    fn rock_of_block(&self, code: &RegistryKey) -> Option<RockId> {
        match self.reverse.get(code) {
            Some((variant, rock)) if variant == ROCK_BLOCK_VARIANT => Some(rock.clone()),
            _ => None,
        }
    }

    fn code_for(&self, rock: &RockId, variant: &str) -> Option<RegistryKey> {
        self.codes.get(&(rock.clone(), variant.to_string())).cloned()
    }

    fn has_code(&self, rock: &RockId, code: &RegistryKey) -> bool {
        matches!(self.reverse.get(code), Some((_, r)) if r == rock)
    }
}
