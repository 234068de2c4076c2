//! CLI library for testing purposes

pub mod config;
pub mod make;
pub mod preview;
pub mod sync;
pub mod validation;

pub use config::{DEFAULT_CONFIG_FILE, load_config};
pub use respcode::Config;
