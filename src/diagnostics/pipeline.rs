use crate::diagnostics::{MatchingStage, RansacStage, RefinementStage, TimingBreakdown};
use serde::Serialize;

/// End-to-end trace of one matching run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub timings: TimingBreakdown,
    pub matching: MatchingStage,
    pub ransac: RansacStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<RefinementStage>,
}
