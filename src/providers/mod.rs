//! Providers Module - External Data Sources
//!
//! Contract source retrieval. `SourceProvider` is the seam; the Etherscan V2
//! client is the production implementation.

pub mod etherscan;

pub use etherscan::*;
