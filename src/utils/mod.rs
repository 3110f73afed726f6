//! Utility module with helper functions
//!
//! This module provides:
//! - Configuration handling and device selection
//! - Visualization helpers

mod config;
pub mod visualize;

pub use config::{parse_device, Config, DataConfig, ModelConfig, TrainingConfigFile};
pub use visualize::{render_grid, run_dir, save_grid, snapshot_path};
