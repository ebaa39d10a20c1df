//! Environment source adapters.

use std::path::Path;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::ports::{EnvironmentSource, EnvironmentSnapshot};

/// Source backed by a stored snapshot.
///
/// A source without a snapshot behaves like server-side rendering.
#[derive(Debug, Default)]
pub struct SnapshotEnvironment {
    snapshot: RwLock<Option<EnvironmentSnapshot>>,
}

impl SnapshotEnvironment {
    /// Source reporting the given browser readings.
    #[must_use]
    pub fn browser(snapshot: EnvironmentSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
        }
    }

    /// Source with no browser context.
    #[must_use]
    pub fn server() -> Self {
        Self::default()
    }

    /// Parses readings from JSON (camelCase keys).
    ///
    /// # Errors
    /// Returns error if the JSON does not describe a snapshot.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::browser(serde_json::from_str(json)?))
    }

    /// Reads readings from a JSON file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading environment snapshot");
        Self::from_json(&content).map_err(std::io::Error::other)
    }

    /// Replaces the readings, e.g. after an orientation change.
    pub fn update(&self, snapshot: Option<EnvironmentSnapshot>) {
        *self.snapshot.write() = snapshot;
    }
}

impl EnvironmentSource for SnapshotEnvironment {
    fn snapshot(&self) -> Option<EnvironmentSnapshot> {
        self.snapshot.read().clone()
    }
}
