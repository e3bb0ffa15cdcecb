#![allow(dead_code)]

use keypoint_homography::synthetic::{generate_pair, SceneSpec, SyntheticPair};
use keypoint_homography::{apply_homography_points, DescriptorStore, Homography, PipelineConfig};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Generates a scene and wraps it into a store; the pair is returned for its
/// ground truth.
pub fn scene(
    points: usize,
    outliers: usize,
    homography: Homography,
    seed: u64,
) -> (DescriptorStore, SyntheticPair) {
    scene_from(&SceneSpec {
        points,
        outliers,
        homography,
        seed,
        ..Default::default()
    })
}

pub fn scene_from(spec: &SceneSpec) -> (DescriptorStore, SyntheticPair) {
    let pair = generate_pair(spec);
    let store = DescriptorStore::from_keypoints(pair.left.clone(), pair.right.clone())
        .expect("synthetic keypoints form a valid store");
    (store, pair)
}

pub fn seeded_config(seed: u64) -> PipelineConfig {
    PipelineConfig::default().with_seed(Some(seed))
}

/// Largest distance between the projections of `a` and `b` over a grid
/// covering the image.
pub fn max_projection_gap(a: &Homography, b: &Homography, width: f32, height: f32) -> f32 {
    let grid: Vec<[f32; 2]> = (0..=8)
        .flat_map(|i| (0..=8).map(move |j| [width * i as f32 / 8.0, height * j as f32 / 8.0]))
        .collect();
    let (Some(pa), Some(pb)) = (
        apply_homography_points(a, &grid),
        apply_homography_points(b, &grid),
    ) else {
        return f32::INFINITY;
    };
    pa.iter()
        .zip(&pb)
        .map(|(p, q)| ((p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2)).sqrt())
        .fold(0.0, f32::max)
}
