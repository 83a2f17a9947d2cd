//! Caller-facing error kinds for registry operations.

use crate::config::ConfigError;
use crate::input::extract::MissingFields;
use crate::model::path::PathError;
use crate::repo::config_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Rejected input; nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingName,
    MissingFields(MissingFields),
    InvalidName { name: String, reason: &'static str },
    InvalidPath(PathError),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "can't save display point: no name specified"),
            Self::MissingFields(missing) => write!(f, "{missing}"),
            Self::InvalidName { name, reason } => {
                write!(f, "invalid display point name `{name}`: {reason}")
            }
            Self::InvalidPath(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingFields(missing) => Some(missing),
            Self::InvalidPath(err) => Some(err),
            Self::MissingName | Self::InvalidName { .. } => None,
        }
    }
}

/// Admin navigation or action that does not map to an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    BadUrl(String),
    UnknownView(String),
    UnknownAction(String),
    InvalidTemplate(String),
}

impl Display for RoutingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadUrl(path) => write!(f, "bad admin url: {path}"),
            Self::UnknownView(view) => write!(f, "unknown view: {view}"),
            Self::UnknownAction(action) => write!(f, "unknown action: {action}"),
            Self::InvalidTemplate(template) => write!(f, "invalid admin route template: {template}"),
        }
    }
}

impl Error for RoutingError {}

/// Error returned by every registry operation.
#[derive(Debug)]
pub enum RegistryError {
    Validation(ValidationError),
    NotFound(String),
    Routing(RoutingError),
    Storage(StoreError),
    Config(ConfigError),
    /// A stored spec could not be rendered as indented text.
    Render(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "can't find point named {name}"),
            Self::Routing(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Render(message) => write!(f, "can't render display point: {message}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::Render(_) => None,
            Self::Routing(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RegistryError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MissingFields> for RegistryError {
    fn from(value: MissingFields) -> Self {
        Self::Validation(ValidationError::MissingFields(value))
    }
}

impl From<PathError> for RegistryError {
    fn from(value: PathError) -> Self {
        Self::Validation(ValidationError::InvalidPath(value))
    }
}

impl From<RoutingError> for RegistryError {
    fn from(value: RoutingError) -> Self {
        Self::Routing(value)
    }
}

impl From<StoreError> for RegistryError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<ConfigError> for RegistryError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}
