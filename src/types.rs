use serde::{Deserialize, Serialize};

/// A keypoint as delivered by the feature extractor.
///
/// Descriptors are expected to be L2-normalized; the pipeline compares them
/// with a plain dot product and never re-normalizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Position in image pixel coordinates.
    pub position: [f32; 2],
    pub scale: f32,
    /// Orientation in degrees.
    pub orientation: f32,
    pub descriptor: Vec<f32>,
}

impl Keypoint {
    pub fn new(position: [f32; 2], scale: f32, orientation: f32, descriptor: Vec<f32>) -> Self {
        Self {
            position,
            scale,
            orientation,
            descriptor,
        }
    }
}

/// Match annotation for one keypoint of the query collection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correspondence {
    /// Index of the keypoint in the query collection.
    pub query: usize,
    /// Index of the best match in the target collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    /// Dot-product similarity of the best match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Second-best over best similarity in `[0, 1]`; 1.0 without a runner-up.
    pub ambiguity: f32,
    /// Reprojection distance (pixels) under the final homography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_error: Option<f32>,
}

impl Correspondence {
    pub fn unmatched(query: usize) -> Self {
        Self {
            query,
            target: None,
            score: None,
            ambiguity: 1.0,
            match_error: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.target.is_some()
    }

    /// Lowe-style ratio test on the ambiguity ratio.
    pub fn passes_ratio(&self, match_ratio: f32, comparison: RatioComparison) -> bool {
        self.is_matched() && comparison.below(self.ambiguity, match_ratio)
    }
}

/// The query collection's match annotations, indexed like the query keypoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Correspondences {
    entries: Vec<Correspondence>,
}

impl Correspondences {
    pub fn new(entries: Vec<Correspondence>) -> Self {
        Self { entries }
    }

    /// `n` entries without a match.
    pub fn unmatched(n: usize) -> Self {
        Self {
            entries: (0..n).map(Correspondence::unmatched).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, query: usize) -> Option<&Correspondence> {
        self.entries.get(query)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Correspondence] {
        &self.entries
    }

    pub fn matched_count(&self) -> usize {
        self.entries.iter().filter(|c| c.is_matched()).count()
    }

    pub fn ratio_passing(&self, match_ratio: f32, comparison: RatioComparison) -> usize {
        self.entries
            .iter()
            .filter(|c| c.passes_ratio(match_ratio, comparison))
            .count()
    }

    /// Copy of `self` with `match_error` recomputed for every entry.
    pub fn with_match_errors<F>(&self, mut error_of: F) -> Self
    where
        F: FnMut(&Correspondence) -> Option<f32>,
    {
        let entries = self
            .entries
            .iter()
            .map(|c| Correspondence {
                match_error: error_of(c),
                ..*c
            })
            .collect();
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Correspondences {
    type Item = &'a Correspondence;
    type IntoIter = std::slice::Iter<'a, Correspondence>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Comparison used by the score and ambiguity thresholds.
///
/// `Strict` accepts `score > min` and `ambiguity < max`; `Inclusive` also
/// accepts equality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioComparison {
    #[default]
    Strict,
    Inclusive,
}

impl RatioComparison {
    #[inline]
    pub fn below(self, value: f32, limit: f32) -> bool {
        match self {
            RatioComparison::Strict => value < limit,
            RatioComparison::Inclusive => value <= limit,
        }
    }

    #[inline]
    pub fn above(self, value: f32, limit: f32) -> bool {
        match self {
            RatioComparison::Strict => value > limit,
            RatioComparison::Inclusive => value >= limit,
        }
    }
}

/// Score/ambiguity admission rule shared by the estimator and the refiner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlierGate {
    pub min_score: f32,
    pub max_ambiguity: f32,
    pub comparison: RatioComparison,
}

impl Default for InlierGate {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            max_ambiguity: 1.0,
            comparison: RatioComparison::Strict,
        }
    }
}

impl InlierGate {
    pub fn new(min_score: f32, max_ambiguity: f32) -> Self {
        Self {
            min_score,
            max_ambiguity,
            ..Default::default()
        }
    }

    /// True when `c` has a match whose score and ambiguity clear the gate.
    pub fn admits(&self, c: &Correspondence) -> bool {
        match (c.target, c.score) {
            (Some(_), Some(score)) => {
                self.comparison.above(score, self.min_score)
                    && self.comparison.below(c.ambiguity, self.max_ambiguity)
            }
            _ => false,
        }
    }
}
