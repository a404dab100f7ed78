//! Checker configuration.
//!
//! Everything has a default matching graphene, so an empty JSON object
//! (or no config file at all) is a valid configuration.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_RESOLVER_PREFIX: &str = "resolve_";
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Fully-qualified names of the schema library's declarative constructs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySymbols {
    pub field: String,
    pub argument: String,
    pub list: String,
    pub non_null: String,
    pub object_type: String,
    pub interface: String,
    pub scalar: String,
    pub enum_: String,
    pub unmounted_type: String,
    pub structure: String,
}

impl Default for LibrarySymbols {
    fn default() -> Self {
        Self {
            field: "graphene.types.field.Field".into(),
            argument: "graphene.types.argument.Argument".into(),
            list: "graphene.types.structures.List".into(),
            non_null: "graphene.types.structures.NonNull".into(),
            object_type: "graphene.types.objecttype.ObjectType".into(),
            interface: "graphene.types.interface.Interface".into(),
            scalar: "graphene.types.scalars.Scalar".into(),
            enum_: "graphene.types.enum.Enum".into(),
            unmounted_type: "graphene.types.unmountedtype.UnmountedType".into(),
            structure: "graphene.types.structures.Structure".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Method-name prefix that marks a resolver (`resolve_<field>`).
    pub resolver_prefix: String,
    pub symbols: LibrarySymbols,
    /// Keyword arguments of `Field(...)` that configure the field itself and
    /// never declare a field argument.
    pub reserved_keywords: Vec<String>,
    /// Resolver name on interfaces that picks the concrete object type at
    /// runtime; exempt from the "no such field" check.
    pub polymorphic_resolver: String,
    /// Upper bound on semantic passes before giving up on deferred classes.
    pub max_iterations: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            resolver_prefix: DEFAULT_RESOLVER_PREFIX.into(),
            symbols: LibrarySymbols::default(),
            reserved_keywords: ["description", "required", "default_value", "deprecation_reason"]
                .into_iter()
                .map(String::from)
                .collect(),
            polymorphic_resolver: "type".into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl CheckerConfig {
    pub fn from_json_str(source: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(source).map_err(|error| Error::Config {
            origin: "<inline>".into(),
            message: error.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        crate::path_de::from_str_with_path(&source).map_err(|error| Error::Config {
            origin: path.display().to_string(),
            message: error.to_string(),
        })
    }

    pub fn is_reserved_keyword(&self, name: &str) -> bool {
        self.reserved_keywords.iter().any(|reserved| reserved == name)
    }

    /// Field name a resolver method resolves, if `method` carries the prefix.
    pub fn resolver_field_name<'a>(&self, method: &'a str) -> Option<&'a str> {
        method.strip_prefix(self.resolver_prefix.as_str())
    }
}
