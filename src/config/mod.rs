//! Configuration for the hover trailer extension
//!
//! - **settings**: operator-editable TOML settings with env overrides and validation
//! - **snapshot**: the immutable, validated payload the browser build consumes

pub mod settings;
pub mod snapshot;

// Re-export commonly used types
pub use settings::PluginSettings;
pub use snapshot::{CardMarkup, ConfigSnapshot, PositioningMode, SizingMode};
