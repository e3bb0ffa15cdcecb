//! Robust homography estimation from gated correspondences (RANSAC).
//!
//! # Algorithm Outline
//! 1. Keep the matched correspondences whose score and ambiguity clear the
//!    gate; fewer than four of them means no model can be formed.
//! 2. For each attempt draw four distinct pairs, reject near-collinear or
//!    duplicate samples, and solve the homography exactly.
//! 3. Score the candidate over every gated pair by squared reprojection
//!    error, skipping pairs whose projection is unstable.
//! 4. Keep the best candidate: most inliers, then lowest mean squared error,
//!    then lowest attempt index.
//!
//! Each attempt owns a ChaCha8 stream derived from the run seed and the
//! attempt index, and the selection in step 4 is a total order, so attempts
//! are folded in any order (sequentially or on the rayon pool) to the same
//! result.

mod options;

pub use options::RansacOptions;

use crate::geometry::{self, PointPair, Score, MIN_POINTS};
use crate::homography::Homography;
use crate::store::KeypointSet;
use crate::types::Correspondences;
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::time::Instant;

/// Outcome of a RANSAC run.
///
/// `homography` is `None` when no attempt produced a valid candidate, in
/// which case `inliers` is zero.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RansacResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homography: Option<Homography>,
    pub inliers: usize,
    /// Mean squared reprojection error over the inliers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_error_sq: Option<f32>,
    /// Gated correspondences available for sampling and scoring.
    pub pool_size: usize,
    /// Attempts actually run (skipped ones under a time budget excluded).
    pub attempts: usize,
    pub degenerate_samples: usize,
    pub elapsed_ms: f64,
}

impl RansacResult {
    pub fn found(&self) -> bool {
        self.homography.is_some()
    }

    fn no_model(pool_size: usize, elapsed_ms: f64) -> Self {
        Self {
            homography: None,
            inliers: 0,
            mean_error_sq: None,
            pool_size,
            attempts: 0,
            degenerate_samples: 0,
            elapsed_ms,
        }
    }
}

pub struct RansacEstimator {
    options: RansacOptions,
}

impl RansacEstimator {
    pub fn new(options: RansacOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RansacOptions {
        &self.options
    }

    /// Estimates the homography mapping query positions onto their matched
    /// target positions.
    pub fn estimate(
        &self,
        queries: &KeypointSet,
        targets: &KeypointSet,
        matches: &Correspondences,
    ) -> RansacResult {
        let t0 = Instant::now();
        let pool = geometry::gated_pairs(queries, targets, matches, &self.options.gate);
        if pool.len() < MIN_POINTS {
            debug!(
                "RANSAC: {} gated correspondences, need {} -> no model",
                pool.len(),
                MIN_POINTS
            );
            return RansacResult::no_model(pool.len(), elapsed_ms(t0));
        }

        let seed = self.options.seed.unwrap_or_else(rand::random);
        let threshold_sq = self.options.inlier_threshold_px * self.options.inlier_threshold_px;
        let ctx = AttemptContext {
            pool: &pool,
            seed,
            threshold_sq,
            started: t0,
            budget_ms: self.options.time_budget_ms,
        };

        let attempts = 0..self.options.max_attempts;
        let tally = if self.options.parallel {
            attempts
                .into_par_iter()
                .map(|k| ctx.run(k))
                .fold(Tally::default, Tally::absorb)
                .reduce(Tally::default, Tally::merge)
        } else {
            attempts
                .map(|k| ctx.run(k))
                .fold(Tally::default(), Tally::absorb)
        };

        let elapsed = elapsed_ms(t0);
        let result = match tally.best {
            Some(best) => RansacResult {
                homography: Some(best.homography),
                inliers: best.score.inliers,
                mean_error_sq: best.score.mean_error().map(|v| v as f32),
                pool_size: pool.len(),
                attempts: tally.attempts,
                degenerate_samples: tally.degenerate,
                elapsed_ms: elapsed,
            },
            None => RansacResult {
                attempts: tally.attempts,
                degenerate_samples: tally.degenerate,
                ..RansacResult::no_model(pool.len(), elapsed)
            },
        };
        info!(
            "RANSAC: pool={} attempts={} degenerate={} inliers={} found={} elapsed_ms={:.3}",
            result.pool_size,
            result.attempts,
            result.degenerate_samples,
            result.inliers,
            result.found(),
            result.elapsed_ms
        );
        result
    }
}

struct AttemptContext<'a> {
    pool: &'a [PointPair],
    seed: u64,
    threshold_sq: f32,
    started: Instant,
    budget_ms: Option<f64>,
}

impl AttemptContext<'_> {
    fn run(&self, attempt: usize) -> Attempt {
        if let Some(budget) = self.budget_ms {
            if elapsed_ms(self.started) >= budget {
                return Attempt::Skipped;
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(attempt as u64);
        let picks = rand::seq::index::sample(&mut rng, self.pool.len(), MIN_POINTS);

        let mut src = [[0.0f32; 2]; MIN_POINTS];
        let mut dst = [[0.0f32; 2]; MIN_POINTS];
        for (slot, idx) in picks.into_iter().enumerate() {
            src[slot] = self.pool[idx].src;
            dst[slot] = self.pool[idx].dst;
        }
        if geometry::is_degenerate_sample(&src) || geometry::is_degenerate_sample(&dst) {
            return Attempt::Degenerate;
        }
        let homography = match geometry::fit_homography(&src, &dst) {
            Ok(h) => h,
            Err(_) => return Attempt::Degenerate,
        };

        let score = geometry::score_pairs(&homography, self.pool, self.threshold_sq);
        Attempt::Candidate(Candidate {
            attempt,
            homography,
            score,
        })
    }
}

enum Attempt {
    Skipped,
    Degenerate,
    Candidate(Candidate),
}

#[derive(Clone, Debug)]
struct Candidate {
    attempt: usize,
    homography: Homography,
    score: Score,
}

impl Candidate {
    /// Total order used to pick the winner; `Greater` means `self` wins.
    fn rank(&self, other: &Candidate) -> Ordering {
        let mean = |c: &Candidate| c.score.mean_error().unwrap_or(f64::INFINITY);
        self.score
            .inliers
            .cmp(&other.score.inliers)
            .then_with(|| mean(other).total_cmp(&mean(self)))
            .then_with(|| other.attempt.cmp(&self.attempt))
    }
}

#[derive(Default)]
struct Tally {
    best: Option<Candidate>,
    attempts: usize,
    degenerate: usize,
}

impl Tally {
    fn absorb(mut self, attempt: Attempt) -> Self {
        match attempt {
            Attempt::Skipped => {}
            Attempt::Degenerate => {
                self.attempts += 1;
                self.degenerate += 1;
            }
            Attempt::Candidate(c) => {
                self.attempts += 1;
                self.best = pick(self.best.take(), Some(c));
            }
        }
        self
    }

    fn merge(self, other: Tally) -> Self {
        Self {
            best: pick(self.best, other.best),
            attempts: self.attempts + other.attempts,
            degenerate: self.degenerate + other.degenerate,
        }
    }
}

fn pick(a: Option<Candidate>, b: Option<Candidate>) -> Option<Candidate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.rank(&a) == Ordering::Greater { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}

fn elapsed_ms(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Correspondence, Keypoint};

    fn descriptor() -> Vec<f32> {
        vec![1.0]
    }

    /// Query/target sets where query `i` matches target `i` exactly.
    fn matched_sets(src: &[[f32; 2]], dst: &[[f32; 2]]) -> (KeypointSet, KeypointSet, Correspondences) {
        let q = src
            .iter()
            .map(|p| Keypoint::new(*p, 1.0, 0.0, descriptor()))
            .collect();
        let t = dst
            .iter()
            .map(|p| Keypoint::new(*p, 1.0, 0.0, descriptor()))
            .collect();
        let matches = (0..src.len())
            .map(|i| Correspondence {
                query: i,
                target: Some(i),
                score: Some(1.0),
                ambiguity: 0.1,
                match_error: None,
            })
            .collect();
        (
            KeypointSet::new(q).unwrap(),
            KeypointSet::new(t).unwrap(),
            Correspondences::new(matches),
        )
    }

    fn grid(n: usize) -> Vec<[f32; 2]> {
        (0..n)
            .map(|i| [(i % 10) as f32 * 37.0 + 3.0, (i / 10) as f32 * 29.0 + 5.0])
            .collect()
    }

    fn options(seed: u64, parallel: bool) -> RansacOptions {
        RansacOptions {
            max_attempts: 300,
            seed: Some(seed),
            parallel,
            ..Default::default()
        }
    }

    #[test]
    fn fewer_than_four_matches_finds_no_model() {
        let src = grid(3);
        let (q, t, m) = matched_sets(&src, &src);
        let res = RansacEstimator::new(options(1, true)).estimate(&q, &t, &m);
        assert!(!res.found());
        assert_eq!(res.inliers, 0);
        assert_eq!(res.attempts, 0);
    }

    #[test]
    fn recovers_translation_with_all_inliers() {
        let src = grid(40);
        let dst: Vec<[f32; 2]> = src.iter().map(|p| [p[0] + 5.0, p[1] + 3.0]).collect();
        let (q, t, m) = matched_sets(&src, &dst);
        let res = RansacEstimator::new(options(7, true)).estimate(&q, &t, &m);
        assert_eq!(res.inliers, 40);
        let h = res.homography.unwrap();
        let p = h.project([100.0, 50.0]).unwrap();
        assert!((p[0] - 105.0).abs() < 1e-2 && (p[1] - 53.0).abs() < 1e-2);
    }

    #[test]
    fn seeded_runs_agree_across_execution_modes() {
        let src = grid(30);
        let mut dst: Vec<[f32; 2]> = src.iter().map(|p| [p[0] * 1.1 - 4.0, p[1] + 2.0]).collect();
        for (i, p) in dst.iter_mut().enumerate().step_by(4) {
            p[0] += 40.0 + i as f32;
        }
        let (q, t, m) = matched_sets(&src, &dst);
        let par = RansacEstimator::new(options(11, true)).estimate(&q, &t, &m);
        let seq = RansacEstimator::new(options(11, false)).estimate(&q, &t, &m);
        assert_eq!(par.homography, seq.homography);
        assert_eq!(par.inliers, seq.inliers);
        assert_eq!(par.attempts, seq.attempts);
        assert_eq!(par.inliers, 30 - 8);
    }

    #[test]
    fn collinear_pool_counts_degenerate_attempts() {
        let src: Vec<[f32; 2]> = (0..8).map(|i| [i as f32 * 10.0, i as f32 * 5.0]).collect();
        let (q, t, m) = matched_sets(&src, &src);
        let res = RansacEstimator::new(options(3, true)).estimate(&q, &t, &m);
        assert!(!res.found());
        assert_eq!(res.inliers, 0);
        assert_eq!(res.attempts, 300);
        assert_eq!(res.degenerate_samples, 300);
    }

    #[test]
    fn exhausted_time_budget_returns_valid_empty_result() {
        let src = grid(20);
        let (q, t, m) = matched_sets(&src, &src);
        let opts = RansacOptions {
            time_budget_ms: Some(0.0),
            ..options(5, true)
        };
        let res = RansacEstimator::new(opts).estimate(&q, &t, &m);
        assert_eq!(res.attempts, 0);
        assert!(!res.found());
        assert_eq!(res.pool_size, 20);
    }

    #[test]
    fn rank_prefers_inliers_then_error_then_attempt() {
        let mk = |attempt, inliers, error_sum| Candidate {
            attempt,
            homography: Homography::identity(),
            score: Score {
                inliers,
                error_sum,
                unstable: 0,
            },
        };
        assert_eq!(mk(5, 10, 9.0).rank(&mk(1, 9, 0.0)), Ordering::Greater);
        assert_eq!(mk(5, 10, 1.0).rank(&mk(1, 10, 2.0)), Ordering::Greater);
        assert_eq!(mk(1, 10, 1.0).rank(&mk(5, 10, 1.0)), Ordering::Greater);
        let a = pick(Some(mk(3, 4, 1.0)), Some(mk(2, 4, 1.0))).unwrap();
        let b = pick(Some(mk(2, 4, 1.0)), Some(mk(3, 4, 1.0))).unwrap();
        assert_eq!(a.attempt, 2);
        assert_eq!(b.attempt, 2);
    }
}
