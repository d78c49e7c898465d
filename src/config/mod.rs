//! # Configuration Module
//!
//! This module centralizes all configuration constants for the codecs.
//! Wire-format constants (LowCardinality flags, decimal breakpoints) and tuning
//! values (pool size classes, arena capacity) live side by side so that values
//! which depend on each other are checked together at compile time.
//!
//! Runtime configuration (default time zone, buffer pool sizing, blueprint
//! caching) is set through [`crate::factory::ColumnFactoryBuilder`].
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric and textual configuration values

pub mod constants;
pub use constants::*;
