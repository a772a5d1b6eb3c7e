//! Utils Module - Helper Functions & Shared Utilities
//!
//! Shared constants (single source of truth) and scan telemetry.

pub mod constants;
pub mod telemetry;

pub use constants::*;
pub use telemetry::*;
