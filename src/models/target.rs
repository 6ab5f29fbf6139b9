//! Remote targets and the command list run against each of them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Opaque identifier naming one remote session (a saved profile path,
/// a host name, `user@host`, ...). Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteTarget(String);

impl RemoteTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form of the identifier, used to keep each target's
    /// artifacts in their own directory.
    ///
    /// Identifiers that are already safe are used as is. Any other gets
    /// `~` and a digest of the raw identifier appended, so two targets never
    /// share a directory.
    pub fn slug(&self) -> String {
        let mut slug: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '@') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        // "." and ".." would escape the output directory
        if slug.chars().all(|c| c == '.') {
            slug = slug.replace('.', "_");
        }
        if slug == self.0 {
            return slug;
        }
        let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, self.0.as_bytes()).simple().to_string();
        format!("{}~{}", slug, &digest[..12])
    }

    /// Parse a target list: one identifier per line, surrounding whitespace
    /// trimmed, blank lines and `#` comments ignored
    pub fn parse_list(content: &str) -> Vec<RemoteTarget> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(RemoteTarget::new)
            .collect()
    }

    /// Load a target list file
    pub fn load_list(path: &Path) -> Result<Vec<RemoteTarget>> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::TargetListUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self::parse_list(&content))
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteTarget {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Ordered command list, identical for every target in one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSpec(Vec<String>);

impl CommandSpec {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(commands.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
