//! Namespaced asset codes.
//!
//! Every block and item is identified by a stable `domain:path` code
//! (e.g., `game:rock-granite`). Codes are ordered so that maps keyed by them
//! iterate deterministically and persist stably.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace used when a code omits an explicit domain.
pub const DEFAULT_NAMESPACE: &str = "game";

/// Namespace owned by this workspace's own blocks and items.
pub const MOD_NAMESPACE: &str = "stonequarry";

/// Error returned when parsing an invalid [`RegistryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryKeyError {
    /// Input was empty after trimming.
    #[error("RegistryKey cannot be empty")]
    Empty,
    /// Namespace part was empty.
    #[error("RegistryKey namespace cannot be empty")]
    EmptyNamespace,
    /// Path part was empty.
    #[error("RegistryKey path cannot be empty")]
    EmptyPath,
    /// Namespace exceeded 64 characters.
    #[error("RegistryKey namespace too long (max 64)")]
    NamespaceTooLong,
    /// Path exceeded 128 characters.
    #[error("RegistryKey path too long (max 128)")]
    PathTooLong,
    /// Namespace contained characters outside `a-z0-9_.-`.
    #[error("RegistryKey namespace has invalid characters (allowed: a-z0-9_.-): {0}")]
    InvalidNamespace(String),
    /// Path contained characters outside `a-z0-9_./-`.
    #[error("RegistryKey path has invalid characters (allowed: a-z0-9_./-): {0}")]
    InvalidPath(String),
}

/// A namespaced key of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryKey {
    namespace: String,
    path: String,
}

impl RegistryKey {
    /// Parse a registry key.
    ///
    /// Accepts either:
    /// - `namespace:path`
    /// - `path` (uses [`DEFAULT_NAMESPACE`])
    pub fn parse(input: &str) -> Result<Self, RegistryKeyError> {
        Self::parse_with_default_namespace(input, DEFAULT_NAMESPACE)
    }

    /// Parse a registry key using a caller-provided default namespace.
    pub fn parse_with_default_namespace(
        input: &str,
        default_namespace: &str,
    ) -> Result<Self, RegistryKeyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RegistryKeyError::Empty);
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns, p),
            None => (default_namespace, input),
        };

        Self::new(namespace, path)
    }

    /// Build a key from explicit parts, validating both.
    pub fn new(namespace: &str, path: &str) -> Result<Self, RegistryKeyError> {
        let namespace = namespace.trim();
        let path = path.trim();

        validate_namespace(namespace)?;
        validate_path(path)?;

        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Registry key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registry key path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for RegistryKey {
    type Err = RegistryKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RegistryKey {
    type Error = RegistryKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RegistryKey> for String {
    fn from(key: RegistryKey) -> Self {
        key.to_string()
    }
}

fn validate_namespace(ns: &str) -> Result<(), RegistryKeyError> {
    if ns.is_empty() {
        return Err(RegistryKeyError::EmptyNamespace);
    }
    if ns.len() > 64 {
        return Err(RegistryKeyError::NamespaceTooLong);
    }
    if !ns
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
    {
        return Err(RegistryKeyError::InvalidNamespace(ns.to_string()));
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<(), RegistryKeyError> {
    if path.is_empty() {
        return Err(RegistryKeyError::EmptyPath);
    }
    if path.len() > 128 {
        return Err(RegistryKeyError::PathTooLong);
    }
    if !path
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'))
    {
        return Err(RegistryKeyError::InvalidPath(path.to_string()));
    }
    Ok(())
}
