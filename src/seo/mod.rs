//! Metadata extraction and missing-tag analysis.

pub mod analyze;
pub mod extract;
pub mod service;

pub use analyze::{build_report, missing_important_fields, recommendation_for};
pub use extract::extract;
pub use service::{analyze, analyze_report, parse_target_url, AnalyzeError};
