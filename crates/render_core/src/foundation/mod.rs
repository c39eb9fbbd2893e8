//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and the camera transform helpers
//! - Logging utilities

pub mod logging;
pub mod math;
