//! Registry configuration.
//!
//! # Responsibility
//! - Name the module, the registry key and the admin URL prefix.
//! - Derive the dot paths and route template used by the registry.
//!
//! # Invariants
//! - `module_name` and `registry_key` are non-empty and contain no `.`, `"`,
//!   `\` or control characters.
//! - `admin_prefix` starts with `/` and has no trailing `/`.

use crate::model::path::{is_reserved_char, DotPath, PathError};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MODULE_NAME: &str = "display_editor";
pub const DEFAULT_REGISTRY_KEY: &str = "Display-points";
pub const DEFAULT_ADMIN_PREFIX: &str = "/admin";
const MODULES_KEY: &str = "Modules";

/// Configuration problems found while loading or validating settings.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid registry config: {err}"),
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid registry config field `{field}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Where the registry lives inside the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Key under `Modules` holding this module's settings.
    pub module_name: String,
    /// Key under the module settings holding the named entries.
    pub registry_key: String,
    pub admin_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            module_name: DEFAULT_MODULE_NAME.to_string(),
            registry_key: DEFAULT_REGISTRY_KEY.to_string(),
            admin_prefix: DEFAULT_ADMIN_PREFIX.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Parses a JSON override; absent keys keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_key("module_name", &self.module_name)?;
        check_key("registry_key", &self.registry_key)?;
        let prefix = self.admin_prefix.as_str();
        if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
            return Err(ConfigError::InvalidValue {
                field: "admin_prefix",
                reason: format!("`{prefix}` must start with `/` and not end with `/`"),
            });
        }
        Ok(())
    }

    /// `Modules.<module_name>`
    pub fn module_path(&self) -> Result<DotPath, PathError> {
        DotPath::parse(MODULES_KEY)?.child(&self.module_name)
    }

    /// `Modules.<module_name>.<registry_key>`
    pub fn registry_path(&self) -> Result<DotPath, PathError> {
        self.module_path()?.child(&self.registry_key)
    }

    /// `<admin_prefix>/<module_name>/{view}/{param}`
    pub fn admin_route_template(&self) -> String {
        format!(
            "{}/{}/{{view}}/{{param}}",
            self.admin_prefix.trim_end_matches('/'),
            self.module_name
        )
    }
}

fn check_key(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let reason = if value.trim().is_empty() {
        "must not be blank"
    } else if value.contains('.') || value.chars().any(is_reserved_char) {
        "must not contain `.`, `\"`, `\\` or control characters"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    })
}
