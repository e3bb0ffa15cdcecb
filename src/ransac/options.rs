use crate::types::InlierGate;
use serde::{Deserialize, Serialize};

/// Parameters of the robust homography estimator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacOptions {
    /// Number of minimal-sample attempts.
    pub max_attempts: usize,
    /// Score/ambiguity gate applied to candidate correspondences.
    pub gate: InlierGate,
    /// Reprojection distance (pixels) below which a pair is an inlier.
    pub inlier_threshold_px: f32,
    /// Seed of the per-attempt random streams. `None` draws a fresh seed.
    pub seed: Option<u64>,
    /// Attempts starting after this wall-clock budget are skipped.
    pub time_budget_ms: Option<f64>,
    /// Run attempts on the rayon pool.
    pub parallel: bool,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_attempts: 10_000,
            gate: InlierGate::new(0.5, 1.0),
            inlier_threshold_px: 5.0,
            seed: None,
            time_budget_ms: None,
            parallel: true,
        }
    }
}
