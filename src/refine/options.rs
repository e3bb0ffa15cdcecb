use crate::types::InlierGate;
use serde::{Deserialize, Serialize};

/// Parameters of the iterative least-squares refinement.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineOptions {
    /// Maximum number of re-estimation rounds.
    pub rounds: usize,
    /// Score/ambiguity gate applied before the distance test.
    pub gate: InlierGate,
    /// Reprojection distance (pixels) below which a pair is an inlier.
    pub inlier_threshold_px: f32,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            rounds: 3,
            gate: InlierGate::new(0.8, 0.95),
            inlier_threshold_px: 3.0,
        }
    }
}
