mod common;

use common::{init_logger, max_projection_gap, scene, scene_from, seeded_config};
use keypoint_homography::geometry::{gated_pairs, score_pairs};
use keypoint_homography::synthetic::SceneSpec;
use keypoint_homography::{DescriptorStore, Homography, HomographyPipeline, Keypoint};

#[test]
fn translated_copy_is_fully_recovered() {
    init_logger();
    let truth = Homography::translation(5.0, 3.0);
    let (store, pair) = scene(100, 0, truth, 11);

    let out = HomographyPipeline::new(seeded_config(1)).run(&store);

    assert!(out.found());
    assert_eq!(out.ransac.inliers, 100);
    assert_eq!(out.refined_inliers, 100);
    assert_eq!(out.trace.matching.ratio_passed, 100);
    assert_eq!(out.report.summary.accepted, 100);
    assert!((out.report.summary.accepted_percent - 100.0).abs() < 1e-4);

    for (i, c) in out.matches.iter().enumerate() {
        assert_eq!(c.target, Some(pair.truth[i]));
        assert!((c.score.unwrap() - 1.0).abs() < 1e-5);
        assert!(c.match_error.unwrap() < 1e-2);
    }

    let h = out.homography.unwrap();
    assert!(max_projection_gap(&h, &truth, 640.0, 480.0) < 1e-2);
    for p in &out.report.pairs {
        assert!((p.delta[0] - 5.0).abs() < 1e-3);
        assert!((p.delta[1] - 3.0).abs() < 1e-3);
    }
}

#[test]
fn displaced_outliers_are_rejected() {
    init_logger();
    let truth = Homography::translation(5.0, 3.0);
    let (store, pair) = scene(100, 20, truth, 23);

    let out = HomographyPipeline::new(seeded_config(7)).run(&store);

    assert!(out.found());
    assert!(out.ransac.inliers >= 80, "ransac inliers {}", out.ransac.inliers);
    assert_eq!(out.refined_inliers, 80);
    assert_eq!(out.report.summary.accepted, 80);

    for &q in &pair.outliers {
        let c = out.matches.get(q).unwrap();
        assert_eq!(c.target, Some(pair.truth[q]), "outlier still matches by descriptor");
        assert!(c.match_error.unwrap() > 40.0);
        assert!(out.report.pairs.iter().all(|p| p.query != q));
    }
}

#[test]
fn perspective_scene_with_noise() {
    init_logger();
    let truth = Homography::from_row_major([
        0.9, 0.05, 20.0, -0.03, 1.1, -10.0, 2.0e-4, 1.0e-4, 1.0,
    ]);
    let spec = SceneSpec {
        points: 150,
        outliers: 30,
        homography: truth,
        noise_px: 0.3,
        seed: 5,
        ..Default::default()
    };
    let (store, _) = scene_from(&spec);

    let out = HomographyPipeline::new(seeded_config(3)).run(&store);

    assert!(out.found());
    assert_eq!(out.refined_inliers, 120);
    let h = out.homography.unwrap();
    let gap = max_projection_gap(&h, &truth, spec.width, spec.height);
    assert!(gap < 1.0, "refined homography off by {gap} px");
    let refinement = out.trace.refinement.as_ref().unwrap();
    assert!(refinement.rounds_run >= 1);
    assert_eq!(refinement.inliers, 120);
}

#[test]
fn single_keypoint_yields_no_model() {
    init_logger();
    let kp = Keypoint::new([12.0, 34.0], 2.0, 10.0, vec![0.6, 0.8]);
    let store = DescriptorStore::from_keypoints(vec![kp.clone()], vec![kp]).unwrap();

    let out = HomographyPipeline::new(seeded_config(0)).run(&store);

    assert!(!out.found());
    assert_eq!(out.ransac.inliers, 0);
    assert_eq!(out.ransac.attempts, 0);
    assert!(out.trace.refinement.is_none());
    assert!(out.report.pairs.is_empty());
}

#[test]
fn empty_target_collection_leaves_queries_unmatched() {
    init_logger();
    let (full, pair) = scene(10, 0, Homography::identity(), 2);
    let store = DescriptorStore::new(full.left().clone(), Default::default()).unwrap();
    assert_eq!(store.left().len(), pair.left.len());

    let out = HomographyPipeline::new(seeded_config(0)).run(&store);

    assert_eq!(out.matches.len(), 10);
    assert_eq!(out.matches.matched_count(), 0);
    assert!(out.matches.iter().all(|c| c.ambiguity == 1.0));
    assert!(!out.found());
    assert_eq!(out.report.summary.accepted_percent, 0.0);
}

#[test]
fn point_on_vanishing_line_is_skipped() {
    init_logger();
    // w' = 1 - x / 1024 vanishes at x = 1024.
    let truth = Homography::from_row_major([
        1.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
        -1.0 / 1024.0,
        0.0,
        1.0,
    ]);
    let (base, pair) = scene(60, 0, truth, 31);

    let mut left = base.left().keypoints().to_vec();
    let mut right = base.right().keypoints().to_vec();
    let mut descriptor = vec![0.0f32; pair.left[0].descriptor.len()];
    descriptor[0] = 1.0;
    left.push(Keypoint::new([1024.0, 50.0], 1.0, 0.0, descriptor.clone()));
    right.push(Keypoint::new([10.0, 10.0], 1.0, 0.0, descriptor));
    let store = DescriptorStore::from_keypoints(left, right).unwrap();

    let config = seeded_config(4);
    let out = HomographyPipeline::new(config.clone()).run(&store);

    assert!(out.found());
    assert_eq!(out.refined_inliers, 60);
    let extra = out.matches.get(60).unwrap();
    assert_eq!(extra.target, Some(60));
    assert!(out.report.pairs.iter().all(|p| p.query != 60));

    let pairs = gated_pairs(store.left(), store.right(), &out.matches, &config.ransac.gate);
    let score = score_pairs(&truth, &pairs, 25.0);
    assert_eq!(score.unstable, 1);
    assert_eq!(score.inliers, 60);
}

#[test]
fn seeded_runs_are_reproducible_across_schedulers() {
    init_logger();
    let truth = Homography::from_row_major([1.02, 0.01, -8.0, 0.02, 0.98, 6.0, 1.0e-5, -2.0e-5, 1.0]);
    let (store, _) = scene(80, 25, truth, 17);

    let parallel = HomographyPipeline::new(seeded_config(99)).run(&store);

    let mut sequential_cfg = seeded_config(99);
    sequential_cfg.matcher.parallel = false;
    sequential_cfg.ransac.parallel = false;
    let sequential = HomographyPipeline::new(sequential_cfg).run(&store);

    assert_eq!(parallel.matches, sequential.matches);
    assert_eq!(parallel.ransac.homography, sequential.ransac.homography);
    assert_eq!(parallel.ransac.inliers, sequential.ransac.inliers);
    assert_eq!(parallel.homography, sequential.homography);

    let again = HomographyPipeline::new(seeded_config(99)).run(&store);
    assert_eq!(again.homography, parallel.homography);
}

#[test]
fn recall_listing_finds_true_partners() {
    init_logger();
    let truth = Homography::translation(-4.0, 7.0);
    let (store, pair) = scene(40, 5, truth, 8);

    let pipeline = HomographyPipeline::new(seeded_config(2));
    let out = pipeline.run(&store);
    let listing = pipeline.geometric_recall(&store, &out).unwrap();

    assert_eq!(listing.entries.len(), 40);
    for (i, entry) in listing.entries.iter().enumerate() {
        let truth_target = pair.truth[i];
        let partner = entry.candidates.iter().find(|c| c.target == truth_target);
        if pair.outliers.contains(&i) {
            assert!(partner.is_none());
        } else {
            let partner = partner.unwrap();
            assert!(partner.chosen);
            assert!((partner.similarity - 1.0).abs() < 1e-5);
        }
    }
    assert!(listing.found >= 35);
}
