//! Configuration Module
//!
//! Collaborator interface for resolving cache settings by section name, plus
//! the providers shipped with the crate.

use std::collections::HashMap;
use std::env;

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Size limit applied when a section is found but carries no `SizeLimit`
/// field.
pub const DEFAULT_SIZE_LIMIT: u64 = 60;

// == Provider Interface ==
/// Resolves raw configuration values by section name.
///
/// A provider fails with [`CacheError::SectionNotFound`] when the section is
/// not defined; consumers treat that as fatal rather than substituting a
/// default.
pub trait ConfigurationProvider: Send + Sync {
    /// Returns the raw value stored under `section`.
    fn get(&self, section: &str) -> Result<Value>;
}

// == Cache Settings ==
/// Settings recognized inside a cache configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CacheSettings {
    /// Maximum number of entries; 0 disables the bound.
    pub size_limit: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

// == In-Memory Provider ==
/// Provider backed by an in-process map of sections.
///
/// Sections can be inserted, replaced, and removed at runtime, which makes
/// this the natural provider for tests and for embedders that push settings
/// from their own sources.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    sections: RwLock<HashMap<String, Value>>,
}

impl InMemoryProvider {
    /// Creates a provider with no sections defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a section.
    pub fn insert(&self, section: impl Into<String>, value: Value) {
        self.sections.write().insert(section.into(), value);
    }

    /// Drops a section, if present.
    pub fn remove(&self, section: &str) {
        self.sections.write().remove(section);
    }
}

impl ConfigurationProvider for InMemoryProvider {
    fn get(&self, section: &str) -> Result<Value> {
        self.sections
            .read()
            .get(section)
            .cloned()
            .ok_or_else(|| CacheError::SectionNotFound(section.to_string()))
    }
}

// == Environment Provider ==
/// Provider that reads size limits from environment variables.
///
/// Section `orders` resolves through `ORDERS_SIZE_LIMIT`. A missing variable
/// means the section is not defined.
#[derive(Debug, Default, Clone)]
pub struct EnvProvider;

impl EnvProvider {
    pub fn new() -> Self {
        Self
    }

    fn var_name(section: &str) -> String {
        format!("{}_SIZE_LIMIT", section.to_uppercase())
    }
}

impl ConfigurationProvider for EnvProvider {
    fn get(&self, section: &str) -> Result<Value> {
        let name = Self::var_name(section);
        let raw =
            env::var(&name).map_err(|_| CacheError::SectionNotFound(section.to_string()))?;
        let limit: u64 = raw.parse().map_err(|_| {
            CacheError::InvalidConfig(format!("{name} is not an unsigned integer: {raw}"))
        })?;
        Ok(json!({ "SizeLimit": limit }))
    }
}
