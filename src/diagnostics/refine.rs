use serde::{Deserialize, Serialize};

/// Summary of the iterative refinement stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementStage {
    pub elapsed_ms: f64,
    pub rounds_run: usize,
    pub converged: bool,
    pub inliers: usize,
    pub iterations: Vec<RefinementIteration>,
}

/// One refinement round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementIteration {
    pub round: usize,
    /// Inliers of the homography entering the round.
    pub inliers: usize,
    /// Relative Frobenius change of the re-solved homography; absent when
    /// the round stopped before solving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f32>,
}
