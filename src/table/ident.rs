//! Dotted table identifiers

use crate::error::{LakebenchError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Identifier of a managed table: namespace levels plus a table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdent {
    namespace: Vec<String>,
    name: String,
}

impl TableIdent {
    pub fn new(namespace: Vec<String>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let display = namespace
            .iter()
            .cloned()
            .chain(std::iter::once(name.clone()))
            .collect::<Vec<_>>()
            .join(".");
        for segment in namespace.iter().chain(std::iter::once(&name)) {
            if !is_valid_segment(segment) {
                return Err(LakebenchError::InvalidIdentifier(display));
            }
        }
        Ok(Self { namespace, name })
    }

    /// Parse `a.b.c`: every segment but the last is a namespace level
    pub fn parse(s: &str) -> Result<Self> {
        let mut segments: Vec<String> = s.split('.').map(str::to_string).collect();
        // split always yields at least one element
        let name = segments.pop().unwrap_or_default();
        Self::new(segments, name).map_err(|_| LakebenchError::InvalidIdentifier(s.to_string()))
    }

    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory of the table relative to the warehouse root
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.namespace.iter().collect();
        path.push(&self.name);
        path
    }
}

/// Check namespace levels with the same rules as identifier segments
pub fn validate_namespace(namespace: &[String]) -> Result<()> {
    if namespace.iter().all(|ns| is_valid_segment(ns)) {
        Ok(())
    } else {
        Err(LakebenchError::InvalidIdentifier(namespace.join(".")))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.trim() == segment
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespace {
            write!(f, "{}.", ns)?;
        }
        write!(f, "{}", self.name)
    }
}

impl FromStr for TableIdent {
    type Err = LakebenchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
