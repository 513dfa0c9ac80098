//! Timekeeper - A speech timer server
//!
//! This library tracks elapsed speaking time against green, orange and red
//! thresholds, publishes signal changes to subscribers, and keeps a store of
//! named threshold presets.

pub mod clock;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, StoreError, TimerError};
pub use state::{AppState, SignalState, ThresholdConfig, TimerSession};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
