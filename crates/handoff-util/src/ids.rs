//! Process identifiers handed to the external updater

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a comma-joined process ID list
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid process ID: {0:?}")]
pub struct ProcessIdParseError(pub String);

/// Ordered set of process IDs the updater must wait on before replacing files.
///
/// Order is preserved and duplicates are kept; the updater tolerates both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIds(Vec<u32>);

impl ProcessIds {
    pub fn new(ids: impl Into<Vec<u32>>) -> Self {
        Self(ids.into())
    }

    /// The current process only
    pub fn current() -> Self {
        Self(vec![std::process::id()])
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Comma-joined wire form, e.g. `12,34`
    pub fn to_csv(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for ProcessIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv())
    }
}

impl From<Vec<u32>> for ProcessIds {
    fn from(ids: Vec<u32>) -> Self {
        Self(ids)
    }
}

impl FromStr for ProcessIds {
    type Err = ProcessIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        s.split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<u32>()
                    .map_err(|_| ProcessIdParseError(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
