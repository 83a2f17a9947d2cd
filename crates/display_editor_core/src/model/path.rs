//! Dot-separated addressing into the configuration tree.
//!
//! `Display-points.topbar` is parsed once into `["Display-points", "topbar"]`.
//! Reads walk mappings only: a sequence or scalar met before the last segment
//! means the path is absent, never an error.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SEPARATOR: char = '.';

/// Parse failures for dot paths and single segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    Empty,
    EmptySegment { path: String, index: usize },
    /// The segment holds a character JSON1 path labels cannot carry verbatim.
    ReservedCharacter { segment: String, character: char },
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "path must not be empty"),
            Self::EmptySegment { path, index } => {
                write!(f, "path `{path}` has an empty segment at position {index}")
            }
            Self::ReservedCharacter { segment, character } => write!(
                f,
                "path segment {segment:?} must not contain {character:?}"
            ),
        }
    }
}

impl Error for PathError {}

/// Parsed dot path: an ordered, non-empty list of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotPath {
    segments: Vec<String>,
}

impl DotPath {
    /// Parses `raw` by splitting on `.`.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = raw
            .split(SEPARATOR)
            .enumerate()
            .map(|(index, segment)| {
                if segment.is_empty() {
                    return Err(PathError::EmptySegment {
                        path: raw.to_string(),
                        index,
                    });
                }
                check_segment(segment)?;
                Ok(segment.to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Returns a new path with one literal segment appended.
    ///
    /// The segment is taken as-is: a `.` inside it does not split.
    pub fn child(&self, segment: &str) -> Result<Self, PathError> {
        if segment.is_empty() {
            return Err(PathError::EmptySegment {
                path: format!("{self}{SEPARATOR}"),
                index: self.segments.len(),
            });
        }
        check_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, i.e. the key the path writes to.
    pub fn leaf(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Resolves the path against `root`.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| node.as_object()?.get(segment))
    }

    /// Renders the SQLite JSON1 path, quoting every label: `$."a"."b-c"`.
    pub fn to_json_path(&self) -> String {
        let mut rendered = String::from("$");
        for segment in &self.segments {
            rendered.push_str(".\"");
            rendered.push_str(segment);
            rendered.push('"');
        }
        rendered
    }
}

impl Display for DotPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for DotPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `c` cannot appear inside a quoted JSON1 path label.
///
/// SQLite reads `\` in a label as an escape and stops at `"`; control
/// characters are stored but cannot be looked up again.
pub fn is_reserved_char(c: char) -> bool {
    c == '"' || c == '\\' || c.is_control()
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    match segment.chars().find(|c| is_reserved_char(*c)) {
        Some(character) => Err(PathError::ReservedCharacter {
            segment: segment.to_string(),
            character,
        }),
        None => Ok(()),
    }
}
