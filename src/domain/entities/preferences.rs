//! User display preferences.

use serde::{Deserialize, Serialize};

/// Theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme.
    Light,
    /// Dark theme.
    Dark,
    /// Follow the system color scheme.
    #[default]
    Auto,
}

/// User preferences persisted as plain JSON, without versioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Theme selection.
    #[serde(default)]
    pub theme: ThemeMode,

    /// Enable card and modal animations.
    #[serde(default = "default_true")]
    pub enable_animations: bool,

    /// Force reduced motion regardless of the device setting.
    #[serde(default)]
    pub reduce_motion: bool,

    /// Treat the connection as slow regardless of what the network reports.
    #[serde(default)]
    pub data_saver: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: ThemeMode::default(),
            enable_animations: true,
            reduce_motion: false,
            data_saver: false,
        }
    }
}
