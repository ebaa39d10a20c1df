//! Gallery Images - mobile-adaptive responsive image loading.
//!
//! This crate decides how the college memories gallery loads its photos on
//! a given device: which size and quality to request, which CDN or query
//! URL to use, when to start loading, and what to keep in memory.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the pipeline services and context.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "gallery-images";
