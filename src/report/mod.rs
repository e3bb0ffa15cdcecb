//! Read-only reporting over the final correspondence set.
//!
//! [`Reporter::report`] lists every correspondence whose reprojection error
//! is under the visibility threshold together with the displacement between
//! the matched keypoints, and summarizes how many matches were accepted
//! relative to the smaller collection. [`Reporter::geometric_recall`] lists,
//! per query keypoint, every target keypoint lying near its projection,
//! which shows whether a geometrically correct partner existed even when
//! the descriptor match chose another one.

use crate::homography::Homography;
use crate::store::KeypointSet;
use crate::types::Correspondences;
use serde::{Deserialize, Serialize};

/// Reporter thresholds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Matches with `match_error` (pixels) below this are reported.
    pub visibility_threshold: f32,
    /// Radius (pixels) of the neighbourhood searched by the recall listing.
    pub recall_radius_px: f32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            visibility_threshold: 10.0,
            recall_radius_px: 10.0,
        }
    }
}

/// Counts over both collections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub left_points: usize,
    pub right_points: usize,
    pub accepted: usize,
    /// `accepted` as a percentage of the smaller collection.
    pub accepted_percent: f32,
}

/// One accepted correspondence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedPair {
    pub query: usize,
    pub target: usize,
    pub left: [f32; 2],
    pub right: [f32; 2],
    /// `right - left`.
    pub delta: [f32; 2],
    pub score: f32,
    pub ambiguity: f32,
    pub error: f32,
    pub left_scale: f32,
    pub right_scale: f32,
    pub left_orientation: f32,
    pub right_orientation: f32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub summary: MatchSummary,
    pub pairs: Vec<ReportedPair>,
}

/// Target keypoint found near a projected query keypoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallCandidate {
    pub target: usize,
    pub similarity: f32,
    pub distance: f32,
    /// Whether this target is the descriptor match of the query.
    pub chosen: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallEntry {
    pub query: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen: Option<usize>,
    pub candidates: Vec<RecallCandidate>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallListing {
    pub entries: Vec<RecallEntry>,
    /// Queries with at least one target near their projection.
    pub found: usize,
}

pub struct Reporter {
    options: ReportOptions,
}

impl Reporter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn report(
        &self,
        queries: &KeypointSet,
        targets: &KeypointSet,
        matches: &Correspondences,
    ) -> MatchReport {
        let mut pairs = Vec::new();
        for c in matches {
            let (Some(target), Some(error)) = (c.target, c.match_error) else {
                continue;
            };
            if error.is_nan() || error >= self.options.visibility_threshold {
                continue;
            }
            let (Some(l), Some(r)) = (queries.get(c.query), targets.get(target)) else {
                continue;
            };
            pairs.push(ReportedPair {
                query: c.query,
                target,
                left: l.position,
                right: r.position,
                delta: [r.position[0] - l.position[0], r.position[1] - l.position[1]],
                score: c.score.unwrap_or(0.0),
                ambiguity: c.ambiguity,
                error,
                left_scale: l.scale,
                right_scale: r.scale,
                left_orientation: l.orientation,
                right_orientation: r.orientation,
            });
        }

        let summary = MatchSummary {
            left_points: queries.len(),
            right_points: targets.len(),
            accepted: pairs.len(),
            accepted_percent: percent_of_smaller(pairs.len(), queries.len(), targets.len()),
        };
        MatchReport { summary, pairs }
    }

    pub fn geometric_recall(
        &self,
        queries: &KeypointSet,
        targets: &KeypointSet,
        matches: &Correspondences,
        homography: &Homography,
    ) -> RecallListing {
        let radius_sq = self.options.recall_radius_px * self.options.recall_radius_px;
        let mut found = 0usize;
        let entries: Vec<RecallEntry> = queries
            .keypoints()
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let chosen = matches.get(i).and_then(|c| c.target);
                let candidates: Vec<RecallCandidate> = targets
                    .keypoints()
                    .iter()
                    .enumerate()
                    .filter_map(|(j, t)| {
                        let err = homography.reprojection_error_sq(q.position, t.position)?;
                        (err < radius_sq).then(|| RecallCandidate {
                            target: j,
                            similarity: crate::matcher::similarity(&q.descriptor, &t.descriptor),
                            distance: err.sqrt(),
                            chosen: chosen == Some(j),
                        })
                    })
                    .collect();
                if !candidates.is_empty() {
                    found += 1;
                }
                RecallEntry {
                    query: i,
                    chosen,
                    candidates,
                }
            })
            .collect();
        RecallListing { entries, found }
    }
}

/// `count` as a percentage of `min(a, b)`; zero when either side is empty.
pub fn percent_of_smaller(count: usize, a: usize, b: usize) -> f32 {
    let denom = a.min(b);
    if denom == 0 {
        0.0
    } else {
        100.0 * count as f32 / denom as f32
    }
}
