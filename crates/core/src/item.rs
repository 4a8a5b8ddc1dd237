//! Item stacks carried by players, spawned into the world, or stored by
//! block-entities.

use crate::registry::RegistryKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value stored in an item stack's attribute tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Integer attribute.
    Int(i64),
    /// String attribute.
    Str(String),
}

/// An item stack in inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Block or item code.
    pub code: RegistryKey,
    /// Quantity in stack
    pub count: u32,
    /// Per-stack attributes (e.g. the contents of a carried crate).
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl ItemStack {
    /// Create a new item stack
    pub fn new(code: RegistryKey, count: u32) -> Self {
        Self {
            code,
            count,
            attributes: BTreeMap::new(),
        }
    }

    /// True once every unit has been taken out.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove up to `amount` units, returning how many were removed.
    pub fn remove(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.count);
        self.count -= removed;
        removed
    }

    /// Store an integer attribute.
    pub fn set_int(&mut self, key: &str, value: i64) {
        self.attributes
            .insert(key.to_string(), AttributeValue::Int(value));
    }

    /// Read an integer attribute, falling back to `default`.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.attributes.get(key) {
            Some(AttributeValue::Int(value)) => *value,
            _ => default,
        }
    }

    /// Store a string attribute; `None` removes the key.
    pub fn set_str(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.attributes
                    .insert(key.to_string(), AttributeValue::Str(value.to_string()));
            }
            None => {
                self.attributes.remove(key);
            }
        }
    }

    /// Read a string attribute.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(AttributeValue::Str(value)) => Some(value),
            _ => None,
        }
    }
}
