use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declaration keyword a `class` was written with in the contract source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contract,
    Struct,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Contract => "contract",
            EntityKind::Struct => "struct",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreParserConfig {
    /// Version that `@version` pragmas are checked against.
    pub compiler_version: String,
    pub banned_separator: String,
    pub entity_keywords: IndexMap<String, EntityKind>,
    pub unlock_keyword: String,
}

impl Default for PreParserConfig {
    fn default() -> Self {
        let mut entity_keywords = IndexMap::new();
        entity_keywords.insert("contract".to_string(), EntityKind::Contract);
        entity_keywords.insert("struct".to_string(), EntityKind::Struct);
        Self {
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
            banned_separator: ";".to_string(),
            entity_keywords,
            unlock_keyword: "unlock".to_string(),
        }
    }
}

impl PreParserConfig {
    pub fn with_compiler_version(mut self, version: impl Into<String>) -> Self {
        self.compiler_version = version.into();
        self
    }

    pub fn entity_kind(&self, keyword: &str) -> Option<EntityKind> {
        self.entity_keywords.get(keyword).copied()
    }
}
