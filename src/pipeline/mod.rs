//! End-to-end matching pipeline.
//!
//! [`HomographyPipeline`] runs the stages in order on a [`DescriptorStore`]:
//!
//! - Matching: brute-force nearest neighbour per left keypoint.
//! - RANSAC: robust homography over the loosely gated matches.
//! - Refinement: iterative least squares over the tightly gated inliers,
//!   which also stamps every match with its reprojection error. Skipped
//!   when RANSAC finds no model.
//! - Reporting: visible matches and the accepted-match summary.
//!
//! ```no_run
//! use keypoint_homography::{DescriptorStore, HomographyPipeline, PipelineConfig};
//!
//! # fn example(store: &DescriptorStore) {
//! let pipeline = HomographyPipeline::new(PipelineConfig::default());
//! let out = pipeline.run(store);
//! if let Some(h) = out.homography {
//!     println!("H = {:?}, accepted = {}", h.to_row_major(), out.report.summary.accepted);
//! }
//! # }
//! ```

use crate::config::PipelineConfig;
use crate::diagnostics::{
    MatchingStage, PipelineTrace, RansacStage, RefinementStage, TimingBreakdown,
};
use crate::homography::Homography;
use crate::matcher::Matcher;
use crate::ransac::{RansacEstimator, RansacResult};
use crate::refine::Refiner;
use crate::report::{MatchReport, RecallListing, Reporter};
use crate::store::DescriptorStore;
use crate::types::Correspondences;
use log::{debug, info};
use serde::Serialize;
use std::time::Instant;

/// Everything one pipeline run produces.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    /// Final homography: refined when refinement ran, else the RANSAC one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homography: Option<Homography>,
    /// One entry per left keypoint, `match_error` set under `homography`.
    pub matches: Correspondences,
    pub ransac: RansacResult,
    /// Inliers of the refined homography (0 when refinement was skipped).
    pub refined_inliers: usize,
    pub report: MatchReport,
    pub trace: PipelineTrace,
}

impl PipelineOutput {
    pub fn found(&self) -> bool {
        self.homography.is_some()
    }
}

pub struct HomographyPipeline {
    config: PipelineConfig,
}

impl HomographyPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, store: &DescriptorStore) -> PipelineOutput {
        let total_start = Instant::now();
        let mut timings = TimingBreakdown::default();
        let (left, right) = (store.left(), store.right());

        let start = Instant::now();
        let matches = Matcher::new(self.config.matcher.clone()).match_sets(left, right);
        let matching_ms = timings.record_since("matching", start);
        let matching = MatchingStage {
            elapsed_ms: matching_ms,
            queries: left.len(),
            targets: right.len(),
            matched: matches.matched_count(),
            ratio_passed: matches.ratio_passing(
                self.config.matcher.match_ratio,
                self.config.matcher.comparison,
            ),
            match_ratio: self.config.matcher.match_ratio,
        };
        debug!(
            "Pipeline: {} of {} queries matched, {} pass ratio {:.2}",
            matching.matched, matching.queries, matching.ratio_passed, matching.match_ratio
        );

        let start = Instant::now();
        let ransac = RansacEstimator::new(self.config.ransac.clone()).estimate(left, right, &matches);
        let ransac_ms = timings.record_since("ransac", start);
        let ransac_stage = RansacStage {
            elapsed_ms: ransac_ms,
            pool_size: ransac.pool_size,
            attempts: ransac.attempts,
            degenerate_samples: ransac.degenerate_samples,
            inliers: ransac.inliers,
            found: ransac.found(),
        };

        let (homography, matches, refined_inliers, refinement) = match ransac.homography {
            Some(initial) => {
                let start = Instant::now();
                let refined =
                    Refiner::new(self.config.refine.clone()).refine(left, right, &matches, initial);
                let refine_ms = timings.record_since("refine", start);
                let stage = RefinementStage {
                    elapsed_ms: refine_ms,
                    rounds_run: refined.rounds_run,
                    converged: refined.converged,
                    inliers: refined.inliers,
                    iterations: refined.iterations,
                };
                (
                    Some(refined.homography),
                    refined.matches,
                    refined.inliers,
                    Some(stage),
                )
            }
            None => {
                debug!("Pipeline: no RANSAC model, skipping refinement");
                (None, matches, 0, None)
            }
        };

        let start = Instant::now();
        let report = Reporter::new(self.config.report.clone()).report(left, right, &matches);
        timings.record_since("report", start);
        timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;

        info!(
            "Pipeline: left={} right={} ransac_inliers={} refined_inliers={} accepted={} ({:.1}%) in {:.1} ms",
            left.len(),
            right.len(),
            ransac.inliers,
            refined_inliers,
            report.summary.accepted,
            report.summary.accepted_percent,
            timings.total_ms
        );

        PipelineOutput {
            homography,
            matches,
            ransac,
            refined_inliers,
            report,
            trace: PipelineTrace {
                timings,
                matching,
                ransac: ransac_stage,
                refinement,
            },
        }
    }

    /// Recall listing for a finished run; `None` when no homography was found.
    pub fn geometric_recall(
        &self,
        store: &DescriptorStore,
        output: &PipelineOutput,
    ) -> Option<RecallListing> {
        let h = output.homography.as_ref()?;
        Some(Reporter::new(self.config.report.clone()).geometric_recall(
            store.left(),
            store.right(),
            &output.matches,
            h,
        ))
    }
}
