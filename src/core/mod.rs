//! Core Module - Rule Engine & Scoring Pipeline
//!
//! Lexical detectors, owner/renouncement check, weighted scoring, summaries
//! and the analyzer that drives them.

pub mod analyzer;
pub mod detectors;
pub mod ownership;
pub mod report;
pub mod risk_score;

pub use analyzer::*;
pub use detectors::*;
pub use ownership::*;
pub use report::*;
pub use risk_score::*;
