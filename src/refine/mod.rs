//! Iterative least-squares refinement of a homography.
//!
//! Starting from the RANSAC estimate, every round
//! 1. classifies the gated correspondences as inliers of the current `H`
//!    (same reprojection/score/ambiguity rule as the estimator),
//! 2. stops and keeps the current `H` when fewer than four inliers remain,
//! 3. re-solves `H` by an overdetermined normalized DLT over all inliers.
//!
//! The fit depends only on the inlier set, so once a round reproduces the
//! current `H` the set is stable and further rounds cannot change anything;
//! the loop stops there and reports convergence.

mod options;

pub use options::RefineOptions;

use crate::diagnostics::RefinementIteration;
use crate::geometry::{self, MIN_POINTS};
use crate::homography::Homography;
use crate::store::KeypointSet;
use crate::types::Correspondences;
use log::debug;

/// Result of [`Refiner::refine`].
#[derive(Clone, Debug)]
pub struct RefineResult {
    pub homography: Homography,
    /// Inliers of the final homography.
    pub inliers: usize,
    pub rounds_run: usize,
    /// True when a round reproduced its input homography.
    pub converged: bool,
    pub iterations: Vec<RefinementIteration>,
    /// Input correspondences with `match_error` set under the final homography.
    pub matches: Correspondences,
}

pub struct Refiner {
    options: RefineOptions,
}

impl Refiner {
    pub fn new(options: RefineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RefineOptions {
        &self.options
    }

    pub fn refine(
        &self,
        queries: &KeypointSet,
        targets: &KeypointSet,
        matches: &Correspondences,
        initial: Homography,
    ) -> RefineResult {
        let threshold_sq = self.options.inlier_threshold_px * self.options.inlier_threshold_px;
        let gated = geometry::gated_pairs(queries, targets, matches, &self.options.gate);

        let mut current = initial;
        let mut converged = false;
        let mut iterations = Vec::with_capacity(self.options.rounds);
        for round in 0..self.options.rounds {
            let inliers = geometry::inlier_pairs(&current, &gated, threshold_sq);
            let mut report = RefinementIteration {
                round,
                inliers: inliers.len(),
                change: None,
            };
            if inliers.len() < MIN_POINTS {
                debug!(
                    "Refiner: round {} has {} inliers, keeping current homography",
                    round,
                    inliers.len()
                );
                iterations.push(report);
                break;
            }

            let src: Vec<[f32; 2]> = inliers.iter().map(|p| p.src).collect();
            let dst: Vec<[f32; 2]> = inliers.iter().map(|p| p.dst).collect();
            let updated = match geometry::fit_homography(&src, &dst) {
                Ok(h) => h,
                Err(err) => {
                    debug!("Refiner: round {} least-squares fit failed: {}", round, err);
                    iterations.push(report);
                    break;
                }
            };

            report.change = Some(updated.relative_change(&current));
            iterations.push(report);
            if updated == current {
                converged = true;
                break;
            }
            current = updated;
        }

        let score = geometry::score_pairs(&current, &gated, threshold_sq);
        let annotated = matches.with_match_errors(|c| {
            let src = queries.position(c.query)?;
            let dst = targets.position(c.target?)?;
            current.reprojection_error_sq(src, dst).map(f32::sqrt)
        });
        debug!(
            "Refiner: rounds={} converged={} inliers={}",
            iterations.len(),
            converged,
            score.inliers
        );

        RefineResult {
            homography: current,
            inliers: score.inliers,
            rounds_run: iterations.len(),
            converged,
            iterations,
            matches: annotated,
        }
    }
}
