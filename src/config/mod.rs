//! Configuration module for the bookkeeper
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::BookkeeperPaths;
pub use settings::Settings;
