//! External collaborator module
//!
//! This module contains the preset store the timer reads its threshold
//! configurations from.

pub mod presets;

// Re-export main types
pub use presets::*;
