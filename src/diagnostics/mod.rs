//! Serializable diagnostics emitted by the matching pipeline.
//!
//! `PipelineTrace` is the entry point: one record per stage (matching,
//! robust estimation, refinement) plus a timing breakdown. The structures are
//! plain data so tools can dump them as JSON next to the match report.

pub mod pipeline;
pub mod refine;
pub mod stages;
pub mod timing;

pub use pipeline::PipelineTrace;
pub use refine::{RefinementIteration, RefinementStage};
pub use stages::{MatchingStage, RansacStage};
pub use timing::{StageTiming, TimingBreakdown};
