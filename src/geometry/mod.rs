//! Geometric helpers shared by the robust estimator and the refiner.
//!
//! - [`dlt`] solves homographies from point pairs (minimal and least-squares).
//! - [`gated_pairs`] turns match annotations into position pairs, applying
//!   the score/ambiguity gate.
//! - [`score_pairs`] counts reprojection inliers for a candidate homography,
//!   skipping points whose projection is unstable.

pub mod dlt;

use crate::homography::Homography;
use crate::store::KeypointSet;
use crate::types::{Correspondences, InlierGate};

pub use dlt::{fit_homography, is_degenerate_sample, DltError, MIN_POINTS};

/// Source/destination positions of one gated correspondence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointPair {
    pub query: usize,
    pub src: [f32; 2],
    pub dst: [f32; 2],
}

/// Collects the pairs of every correspondence admitted by `gate`.
///
/// Targets that do not exist in `targets` are skipped.
pub fn gated_pairs(
    queries: &KeypointSet,
    targets: &KeypointSet,
    matches: &Correspondences,
    gate: &InlierGate,
) -> Vec<PointPair> {
    matches
        .iter()
        .filter(|c| gate.admits(c))
        .filter_map(|c| {
            let src = queries.position(c.query)?;
            let dst = targets.position(c.target?)?;
            Some(PointPair {
                query: c.query,
                src,
                dst,
            })
        })
        .collect()
}

/// Inlier statistics of a homography over a set of pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Score {
    pub inliers: usize,
    /// Sum of squared reprojection errors over the inliers.
    pub error_sum: f64,
    /// Pairs excluded because their projection was unstable.
    pub unstable: usize,
}

impl Score {
    /// Mean squared error over the inliers, `None` without inliers.
    pub fn mean_error(&self) -> Option<f64> {
        (self.inliers > 0).then(|| self.error_sum / self.inliers as f64)
    }
}

/// Scores `h` against `pairs`: a pair is an inlier when its squared
/// reprojection error is below `threshold_sq`.
pub fn score_pairs(h: &Homography, pairs: &[PointPair], threshold_sq: f32) -> Score {
    let mut score = Score::default();
    for pair in pairs {
        match h.reprojection_error_sq(pair.src, pair.dst) {
            Some(err) if err < threshold_sq => {
                score.inliers += 1;
                score.error_sum += err as f64;
            }
            Some(_) => {}
            None => score.unstable += 1,
        }
    }
    score
}

/// Pairs that are inliers of `h`.
pub fn inlier_pairs(h: &Homography, pairs: &[PointPair], threshold_sq: f32) -> Vec<PointPair> {
    pairs
        .iter()
        .filter(|p| matches!(h.reprojection_error_sq(p.src, p.dst), Some(err) if err < threshold_sq))
        .copied()
        .collect()
}
