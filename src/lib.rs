//! Generator diagnostics: live parameter classification and offline fault-code enrichment.

pub mod params;
pub mod knowledge;
pub mod engine;
pub mod record;
pub mod sanitize;
pub mod causes;
pub mod classify;
pub mod guidance;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod config;

pub use classify::{Category, FaultSeverity};
pub use engine::{analyze, summarize, DiagnosticResult, DiagnosticSummary};
pub use params::{ParameterSpec, SeverityTier};
pub use pipeline::{EnrichedFaultRecord, EnrichmentOutput, EnrichmentPipeline, PipelineError};
