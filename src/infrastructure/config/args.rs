//! Command line argument definitions.

use super::app_config::LogLevel;
use crate::domain::entities::ThemeMode;
use crate::domain::ports::{ConnectionInfo, EnvironmentSnapshot};
use crate::infrastructure::image::memory_cache::EvictionPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "gallery-images",
    version,
    about = "Mobile-adaptive responsive image loading for the college memories gallery",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path (logs go to stderr otherwise).
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Re-detect device capabilities on every call.
    #[arg(long, global = true)]
    pub development: bool,

    /// CDN cloud name for hosted images.
    #[arg(long, global = true)]
    pub cloud_name: Option<String>,

    /// Site origin that relative image paths are fetched from.
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Directory relative image paths are read from.
    #[arg(long, value_name = "PATH", global = true)]
    pub local_root: Option<PathBuf>,

    /// Maximum entries in the image cache.
    #[arg(long, global = true)]
    pub cache_capacity: Option<usize>,

    /// Image cache eviction policy.
    #[arg(long, value_enum, global = true)]
    pub eviction: Option<EvictionPolicy>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[allow(missing_docs)]
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print capabilities, size decision and URLs for an image.
    Plan(PlanArgs),
    /// Load images through the pipeline and print cache and timing data.
    Fetch(FetchArgs),
    /// Show or change stored user preferences.
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

/// Arguments of `plan`.
#[allow(missing_docs)]
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Image URL or local path.
    pub url: String,

    /// CDN public id of the image.
    #[arg(long)]
    pub cloudinary_id: Option<String>,

    /// Container width in CSS pixels.
    #[arg(long, default_value_t = 400)]
    pub container_width: u32,

    #[command(flatten)]
    pub environment: EnvironmentArgs,
}

/// Arguments of `fetch`.
#[allow(missing_docs)]
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Image URLs or local paths.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Container width in CSS pixels.
    #[arg(long, default_value_t = 400)]
    pub container_width: u32,

    /// Fetch the URLs as given instead of resolving per device.
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub environment: EnvironmentArgs,
}

/// Preference commands.
#[allow(missing_docs)]
#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Print the stored preferences.
    Show,
    /// Update stored preferences.
    Set {
        /// Theme selection.
        #[arg(long, value_enum)]
        theme: Option<ThemeMode>,
        /// Enable animations.
        #[arg(long)]
        enable_animations: Option<bool>,
        /// Force reduced motion.
        #[arg(long)]
        reduce_motion: Option<bool>,
        /// Treat the connection as slow.
        #[arg(long)]
        data_saver: Option<bool>,
    },
}

/// Simulated client environment.
#[derive(Debug, Args)]
pub struct EnvironmentArgs {
    /// Read the environment snapshot from a JSON file.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Behave as if no browser context is available.
    #[arg(long, conflicts_with = "env_file")]
    pub server: bool,

    /// User agent string.
    #[arg(long, default_value = "")]
    pub user_agent: String,

    /// Viewport width.
    #[arg(long, default_value_t = 1920)]
    pub viewport_width: u32,

    /// Viewport height.
    #[arg(long, default_value_t = 1080)]
    pub viewport_height: u32,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    pub dpr: f64,

    /// Effective connection type, e.g. 4g or slow-2g.
    #[arg(long)]
    pub effective_type: Option<String>,

    /// Data saver enabled.
    #[arg(long)]
    pub save_data: bool,

    /// Device memory in GB.
    #[arg(long)]
    pub device_memory: Option<f64>,

    /// Prefers reduced motion.
    #[arg(long)]
    pub reduced_motion: bool,

    /// Prefers a dark color scheme.
    #[arg(long)]
    pub dark: bool,

    /// Maximum touch points.
    #[arg(long, default_value_t = 0)]
    pub touch_points: u32,

    /// Intersection observer unavailable.
    #[arg(long)]
    pub no_observer: bool,
}

impl EnvironmentArgs {
    /// Builds a snapshot from the flags, or `None` for `--server`.
    #[must_use]
    pub fn to_snapshot(&self) -> Option<EnvironmentSnapshot> {
        if self.server {
            return None;
        }
        let connection = (self.effective_type.is_some() || self.save_data).then(|| ConnectionInfo {
            effective_type: self.effective_type.clone(),
            save_data: self.save_data.then_some(true),
        });
        Some(EnvironmentSnapshot {
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            device_pixel_ratio: self.dpr,
            user_agent: self.user_agent.clone(),
            connection,
            device_memory_gb: self.device_memory,
            prefers_reduced_motion: self.reduced_motion,
            prefers_dark: self.dark,
            max_touch_points: self.touch_points,
            intersection_observer_supported: !self.no_observer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_with_environment() {
        let args = CliArgs::try_parse_from([
            "gallery-images",
            "plan",
            "/images/a.jpg",
            "--container-width",
            "1200",
            "--dpr",
            "2",
            "--effective-type",
            "3g",
            "--eviction",
            "lru",
        ])
        .unwrap();

        assert_eq!(args.eviction, Some(EvictionPolicy::Lru));
        let Command::Plan(plan) = args.command else {
            panic!("expected plan");
        };
        assert_eq!(plan.container_width, 1200);
        let snap = plan.environment.to_snapshot().unwrap();
        assert!((snap.device_pixel_ratio - 2.0).abs() < f64::EPSILON);
        assert_eq!(
            snap.connection.and_then(|c| c.effective_type).as_deref(),
            Some("3g")
        );
    }

    #[test]
    fn test_server_flag_has_no_snapshot() {
        let args =
            CliArgs::try_parse_from(["gallery-images", "fetch", "https://x/a.png", "--server"])
                .unwrap();
        let Command::Fetch(fetch) = args.command else {
            panic!("expected fetch");
        };
        assert!(fetch.environment.to_snapshot().is_none());
    }

    #[test]
    fn test_parse_prefs_set() {
        let args = CliArgs::try_parse_from([
            "gallery-images",
            "prefs",
            "set",
            "--theme",
            "dark",
            "--data-saver",
            "true",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            Command::Prefs(PrefsCommand::Set {
                theme: Some(ThemeMode::Dark),
                data_saver: Some(true),
                ..
            })
        ));
    }
}
