//! Configuration module for Ripple-Update
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ripple_update::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("update.toml")).unwrap();
//! println!("Schedule policy: {}", config.schedule.class);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ScheduleConfig, ScoringConfig, StorageConfig, UpdateConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
