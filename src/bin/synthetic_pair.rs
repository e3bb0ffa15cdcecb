use keypoint_homography::config::synthetic::load_config;
use keypoint_homography::homography::Homography;
use keypoint_homography::io::write_json_file;
use keypoint_homography::source::{ExtractorOptions, ImageInfo, KeypointFile};
use keypoint_homography::synthetic::generate_pair;
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;
    let scene = &config.scene;

    let pair = generate_pair(scene);
    let image = Some(ImageInfo {
        width: scene.width.round() as usize,
        height: scene.height.round() as usize,
    });
    let extractor = Some(ExtractorOptions::default());

    let left_count = pair.left.len();
    let right_count = pair.right.len();
    KeypointFile {
        image,
        extractor: extractor.clone(),
        keypoints: pair.left,
    }
    .save(&config.output.left)?;
    KeypointFile {
        image,
        extractor,
        keypoints: pair.right,
    }
    .save(&config.output.right)?;

    println!(
        "Saved {} left keypoints to {}",
        left_count,
        config.output.left.display()
    );
    println!(
        "Saved {} right keypoints to {}",
        right_count,
        config.output.right.display()
    );

    if let Some(path) = &config.output.truth_json {
        let truth = GroundTruth {
            homography: scene.homography,
            correspondences: &pair.truth,
            outliers: &pair.outliers,
        };
        write_json_file(path, &truth)?;
        println!(
            "Saved ground truth ({} outliers) to {}",
            pair.outliers.len(),
            path.display()
        );
    }

    Ok(())
}

fn usage() -> String {
    "Usage: synthetic_pair <config.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GroundTruth<'a> {
    homography: Homography,
    correspondences: &'a [usize],
    outliers: &'a [usize],
}
