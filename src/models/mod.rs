//! Models Module - Data Structures & Configuration
//!
//! Flag catalogue, source/report types, configuration and error codes.

pub mod config;
pub mod errors;
pub mod flags;
pub mod types;

pub use config::*;
pub use errors::*;
pub use flags::*;
pub use types::*;
