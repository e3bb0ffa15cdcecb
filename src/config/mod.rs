//! Pipeline configuration.
//!
//! Every stage option lives in [`PipelineConfig`]. All sections and fields
//! default individually, so a JSON config only needs the values it changes:
//!
//! ```json
//! { "ransac": { "seed": 42 }, "refine": { "rounds": 5 } }
//! ```
//!
//! The command line exposes a single match ratio; [`PipelineConfig::with_match_ratio`]
//! derives the estimator and refiner score gates from it.

pub mod synthetic;

use crate::io::read_json_file;
use crate::matcher::MatcherOptions;
use crate::ransac::RansacOptions;
use crate::refine::RefineOptions;
use crate::report::ReportOptions;
use crate::source::ExtractorOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// RANSAC minimum score relative to the match ratio.
const RANSAC_SCORE_FACTOR: f32 = 0.50 / 0.80;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extractor: ExtractorOptions,
    pub matcher: MatcherOptions,
    pub ransac: RansacOptions,
    pub refine: RefineOptions,
    pub report: ReportOptions,
}

impl PipelineConfig {
    /// Sets the match ratio and the score gates derived from it: the
    /// estimator admits scores above `0.625 · ratio`, the refiner above
    /// `ratio`.
    pub fn with_match_ratio(mut self, ratio: f32) -> Self {
        self.matcher.match_ratio = ratio;
        self.ransac.gate.min_score = RANSAC_SCORE_FACTOR * ratio;
        self.refine.gate.min_score = ratio;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.ransac.seed = seed;
        self
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig, String> {
    read_json_file(path).map_err(|e| format!("Failed to load config: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RatioComparison;

    #[test]
    fn defaults_follow_reference_driver() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.matcher.match_ratio, 0.8);
        assert_eq!(cfg.ransac.max_attempts, 10_000);
        assert_eq!(cfg.ransac.inlier_threshold_px, 5.0);
        assert_eq!(cfg.ransac.gate.max_ambiguity, 1.0);
        assert_eq!(cfg.refine.rounds, 3);
        assert_eq!(cfg.refine.inlier_threshold_px, 3.0);
        assert_eq!(cfg.refine.gate.max_ambiguity, 0.95);
        assert_eq!(cfg.report.visibility_threshold, 10.0);
    }

    #[test]
    fn match_ratio_derives_score_gates() {
        let cfg = PipelineConfig::default().with_match_ratio(0.8);
        assert!((cfg.ransac.gate.min_score - 0.5).abs() < 1e-6);
        assert!((cfg.refine.gate.min_score - 0.8).abs() < 1e-6);

        let cfg = PipelineConfig::default().with_match_ratio(0.64);
        assert!((cfg.ransac.gate.min_score - 0.4).abs() < 1e-6);
        assert_eq!(cfg.matcher.match_ratio, 0.64);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{
            "ransac": { "seed": 42, "gate": { "comparison": "inclusive" } },
            "refine": { "rounds": 5 }
        }"#;
        let cfg: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.ransac.seed, Some(42));
        assert_eq!(cfg.ransac.max_attempts, 10_000);
        assert_eq!(cfg.ransac.gate.comparison, RatioComparison::Inclusive);
        assert_eq!(cfg.refine.rounds, 5);
        assert_eq!(cfg.refine.gate.min_score, 0.8);
        assert_eq!(cfg.extractor.octaves, 5);
    }
}
