//! Image pipeline services.

pub mod capability_detector;
pub mod image_card;
pub mod image_size_policy;
pub mod lazy_load;
pub mod performance_monitor;
