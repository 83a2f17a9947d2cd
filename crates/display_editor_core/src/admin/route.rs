//! Templated admin path matching.
//!
//! A template such as `/admin/display_editor/{view}/{param}` is a run of
//! literal segments followed by placeholder segments. Placeholders missing
//! from the path resolve to `""`, so `/admin/display_editor` yields an empty
//! view.

use crate::service::error::RoutingError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_]*)\}$").expect("valid placeholder regex"));

/// Compiled admin route template.
#[derive(Debug, Clone)]
pub struct AdminRoute {
    template: String,
    matcher: Regex,
    names: Vec<String>,
}

impl AdminRoute {
    /// Compiles `template`; literal segments may not follow a placeholder.
    pub fn compile(template: &str) -> Result<Self, RoutingError> {
        let invalid = || RoutingError::InvalidTemplate(template.to_string());
        if !template.starts_with('/') {
            return Err(invalid());
        }

        let mut pattern = String::from("^");
        let mut names = Vec::new();
        for segment in template.split('/').filter(|segment| !segment.is_empty()) {
            match PLACEHOLDER_RE.captures(segment) {
                Some(captures) => {
                    let name = captures[1].to_string();
                    if names.contains(&name) {
                        return Err(invalid());
                    }
                    pattern.push_str(&format!("(?:/(?P<{name}>[^/]*))?"));
                    names.push(name);
                }
                None if names.is_empty() => {
                    pattern.push('/');
                    pattern.push_str(&regex::escape(segment));
                }
                None => return Err(invalid()),
            }
        }
        pattern.push_str("/?$");

        let matcher = Regex::new(&pattern).map_err(|_| invalid())?;
        Ok(Self {
            template: template.to_string(),
            matcher,
            names,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Resolves `path` against the template.
    ///
    /// A query string (`?...`) is ignored.
    pub fn resolve(&self, path: &str) -> Result<RouteParams, RoutingError> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        let captures = self
            .matcher
            .captures(path)
            .ok_or_else(|| RoutingError::BadUrl(path.to_string()))?;
        let params = self
            .names
            .iter()
            .map(|name| {
                let value = captures.name(name).map_or("", |value| value.as_str());
                (name.clone(), value.to_string())
            })
            .collect();
        Ok(RouteParams(params))
    }
}

/// Placeholder values captured from one admin path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    /// Returns the captured value, `""` when the placeholder was absent.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }
}
