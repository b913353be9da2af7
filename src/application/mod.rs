pub mod analysis_service;
pub mod error;
pub mod insights;

pub use analysis_service::{AnalysisOutcome, AnalysisService, AnalysisSettings, ReportSource};
pub use error::AnalysisError;
pub use insights::InsightGenerator;
