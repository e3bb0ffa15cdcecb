use serde::{Deserialize, Serialize};

/// Descriptor matching statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingStage {
    pub elapsed_ms: f64,
    pub queries: usize,
    pub targets: usize,
    pub matched: usize,
    /// Matches passing the ratio test at `match_ratio`.
    pub ratio_passed: usize,
    pub match_ratio: f32,
}

/// Robust estimation statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RansacStage {
    pub elapsed_ms: f64,
    pub pool_size: usize,
    pub attempts: usize,
    pub degenerate_samples: usize,
    pub inliers: usize,
    pub found: bool,
}
