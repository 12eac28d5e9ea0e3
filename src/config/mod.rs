//! Configuration management for portlens.
//!
//! Provides XDG-compliant settings storage and the built-in port presets.

mod presets;
mod settings;

pub use presets::PortPreset;
pub use settings::{AppSettings, Paths};
