//! Synthetic keypoint pairs with known geometry.
//!
//! Used by the `synthetic_pair` tool and the tests: query keypoints are
//! scattered over an image, each target keypoint carries the same descriptor
//! at the query position mapped through a known homography. A configurable
//! number of queries become outliers: their target is displaced far away
//! from the true projection while keeping the identical descriptor, so the
//! matcher pairs them confidently but the geometry rejects them. Targets are
//! shuffled so that match indices differ from query indices.
use crate::homography::Homography;
use crate::types::Keypoint;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSpec {
    pub points: usize,
    /// How many of the `points` queries get a displaced target.
    pub outliers: usize,
    pub width: f32,
    pub height: f32,
    pub descriptor_len: usize,
    pub homography: Homography,
    /// Uniform position noise (pixels) added to inlier targets.
    pub noise_px: f32,
    /// Minimum displacement (pixels) of an outlier target from the truth.
    pub outlier_offset_px: f32,
    pub seed: u64,
}

impl Default for SceneSpec {
    fn default() -> Self {
        Self {
            points: 100,
            outliers: 0,
            width: 640.0,
            height: 480.0,
            descriptor_len: 128,
            homography: Homography::identity(),
            noise_px: 0.0,
            outlier_offset_px: 50.0,
            seed: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SyntheticPair {
    pub left: Vec<Keypoint>,
    pub right: Vec<Keypoint>,
    /// `truth[i]` is the index in `right` holding the counterpart of `left[i]`.
    pub truth: Vec<usize>,
    /// Indices into `left` whose counterpart is an outlier.
    pub outliers: Vec<usize>,
}

pub fn generate_pair(spec: &SceneSpec) -> SyntheticPair {
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);
    let outliers = spec.outliers.min(spec.points);
    let first_outlier = spec.points - outliers;
    let margin = 0.05 * spec.width.min(spec.height);

    let mut left = Vec::with_capacity(spec.points);
    let mut counterparts = Vec::with_capacity(spec.points);
    for i in 0..spec.points {
        let pos = [
            rng.random_range(margin..spec.width - margin),
            rng.random_range(margin..spec.height - margin),
        ];
        let scale = rng.random_range(1.0..8.0f32);
        let orientation = rng.random_range(-180.0..180.0f32);
        let descriptor = random_unit_vector(&mut rng, spec.descriptor_len);

        let projected = spec.homography.project(pos).unwrap_or(pos);
        let target_pos = if i >= first_outlier {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let dist = spec.outlier_offset_px * rng.random_range(1.0..3.0f32);
            [
                projected[0] + dist * angle.cos(),
                projected[1] + dist * angle.sin(),
            ]
        } else if spec.noise_px > 0.0 {
            [
                projected[0] + rng.random_range(-spec.noise_px..spec.noise_px),
                projected[1] + rng.random_range(-spec.noise_px..spec.noise_px),
            ]
        } else {
            projected
        };

        counterparts.push(Keypoint::new(
            target_pos,
            scale,
            orientation,
            descriptor.clone(),
        ));
        left.push(Keypoint::new(pos, scale, orientation, descriptor));
    }

    let mut order: Vec<usize> = (0..spec.points).collect();
    order.shuffle(&mut rng);
    let mut truth = vec![0usize; spec.points];
    for (slot, &src) in order.iter().enumerate() {
        truth[src] = slot;
    }
    let right = order.iter().map(|&src| counterparts[src].clone()).collect();

    SyntheticPair {
        left,
        right,
        truth,
        outliers: (first_outlier..spec.points).collect(),
    }
}

/// Uniformly distributed direction in `dim` dimensions, unit length.
pub fn random_unit_vector<R: Rng>(rng: &mut R, dim: usize) -> Vec<f32> {
    loop {
        let v: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0..1.0f32)).collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-3 {
            return v.into_iter().map(|x| x / norm).collect();
        }
    }
}
