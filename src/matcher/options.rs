use crate::types::RatioComparison;
use serde::{Deserialize, Serialize};

/// Parameters of the brute-force descriptor matcher.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    /// Ratio-test threshold on the ambiguity ratio (second-best / best).
    pub match_ratio: f32,
    /// Comparison applied by the ratio test.
    pub comparison: RatioComparison,
    /// Scan queries on the rayon pool. Results are identical either way.
    pub parallel: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            match_ratio: 0.8,
            comparison: RatioComparison::Strict,
            parallel: true,
        }
    }
}
