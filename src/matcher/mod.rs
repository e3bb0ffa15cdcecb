//! Brute-force descriptor matching.
//!
//! For every query keypoint the matcher scans all target descriptors, keeping
//! the best and second-best dot-product similarity together with the index of
//! the best one. The scan is exact, `O(n_A · n_B · D)`, and allocates nothing
//! per pair.
//!
//! Ties on the best similarity keep the first (lowest-index) target: the best
//! is only replaced on a strictly larger score, so an equal score becomes the
//! runner-up and drives the ambiguity ratio to 1.0. Queries are independent
//! and may run on the rayon pool; each query's scan stays sequential in index
//! order, which keeps the tie-break independent of scheduling.

mod options;

pub use options::MatcherOptions;

use crate::store::KeypointSet;
use crate::types::{Correspondence, Correspondences};
use log::debug;
use rayon::prelude::*;

pub struct Matcher {
    options: MatcherOptions,
}

impl Matcher {
    pub fn new(options: MatcherOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    /// Finds the best target for every query keypoint.
    ///
    /// The returned annotations are aligned with `queries`. An empty target
    /// collection yields unmatched entries for every query.
    pub fn match_sets(&self, queries: &KeypointSet, targets: &KeypointSet) -> Correspondences {
        if targets.is_empty() || queries.is_empty() {
            debug!(
                "Matcher: nothing to compare (queries={} targets={})",
                queries.len(),
                targets.len()
            );
            return Correspondences::unmatched(queries.len());
        }

        let target_kps = targets.keypoints();
        let entries: Vec<Correspondence> = if self.options.parallel {
            queries
                .keypoints()
                .par_iter()
                .enumerate()
                .map(|(i, kp)| best_match(i, &kp.descriptor, target_kps))
                .collect()
        } else {
            queries
                .keypoints()
                .iter()
                .enumerate()
                .map(|(i, kp)| best_match(i, &kp.descriptor, target_kps))
                .collect()
        };

        let matches = Correspondences::new(entries);
        debug!(
            "Matcher: queries={} targets={} matched={} ratio<{:.2}: {}",
            queries.len(),
            targets.len(),
            matches.matched_count(),
            self.options.match_ratio,
            matches.ratio_passing(self.options.match_ratio, self.options.comparison)
        );
        matches
    }
}

#[inline]
pub(crate) fn similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn best_match(query: usize, descriptor: &[f32], targets: &[crate::types::Keypoint]) -> Correspondence {
    let mut best = f32::NEG_INFINITY;
    let mut second = f32::NEG_INFINITY;
    let mut best_idx = None;
    for (j, target) in targets.iter().enumerate() {
        let s = similarity(descriptor, &target.descriptor);
        if s > best {
            second = best;
            best = s;
            best_idx = Some(j);
        } else if s > second {
            second = s;
        }
    }

    match best_idx {
        Some(target) => Correspondence {
            query,
            target: Some(target),
            score: Some(best),
            ambiguity: ambiguity_ratio(best, second),
            match_error: None,
        },
        None => Correspondence::unmatched(query),
    }
}

/// Second-best over best similarity in `[0, 1]`. Without a runner-up, or when
/// the best similarity is not positive, the match is treated as fully
/// ambiguous.
fn ambiguity_ratio(best: f32, second: f32) -> f32 {
    if !second.is_finite() || best <= 0.0 {
        return 1.0;
    }
    (second / best).clamp(0.0, 1.0)
}
