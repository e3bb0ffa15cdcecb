//! keypoint-homography: match two keypoint collections and estimate the
//! homography relating them.

use clap::error::ErrorKind;
use clap::Parser;
use keypoint_homography::config::{load_config, PipelineConfig};
use keypoint_homography::io::write_json_file;
use keypoint_homography::report::RecallListing;
use keypoint_homography::source::{JsonKeypointSource, KeypointSource};
use keypoint_homography::{DescriptorStore, HomographyPipeline, PipelineOutput};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keypoint-homography")]
#[command(about = "Match keypoint descriptors between two images and fit a homography")]
#[command(version)]
struct Cli {
    /// Keypoint file of the left image (JSON).
    left: PathBuf,

    /// Keypoint file of the right image (JSON).
    right: PathBuf,

    /// Path to write the match report (JSON). Prints a summary when omitted.
    out: Option<PathBuf>,

    /// Number of scale-space octaves the keypoints were extracted with [default: 5].
    #[arg(long)]
    octaves: Option<usize>,

    /// Blur already present in the input images [default: 0.0].
    #[arg(long, alias = "initialblur")]
    initial_blur: Option<f32>,

    /// Minimum extremum contrast [default: 5.0].
    #[arg(long, aliases = ["contrastthreshold", "constrastthreshold"])]
    contrast_threshold: Option<f32>,

    /// Maximum principal-curvature ratio [default: 16.0].
    #[arg(long, alias = "curvaturethreshold")]
    curvature_threshold: Option<f32>,

    /// Clamp on descriptor elements before renormalization [default: 0.2].
    #[arg(long, alias = "descriptorthreshold")]
    descriptor_threshold: Option<f32>,

    /// Ratio-test threshold; also sets the RANSAC and refinement score gates [default: 0.8].
    #[arg(long, alias = "matchratio")]
    match_ratio: Option<f32>,

    /// Pipeline config (JSON). Command-line values override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// RANSAC seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// List, per left keypoint, every right keypoint near its projection.
    #[arg(long)]
    list_all: bool,
}

impl Cli {
    /// Applies the options given on the command line to `base`; everything
    /// else keeps the value from the config file (or the built-in default).
    fn apply_to(&self, base: PipelineConfig) -> PipelineConfig {
        let mut config = match self.match_ratio {
            Some(ratio) => base.with_match_ratio(ratio),
            None => base,
        };
        if self.seed.is_some() {
            config = config.with_seed(self.seed);
        }
        let extractor = &mut config.extractor;
        if let Some(v) = self.octaves {
            extractor.octaves = v;
        }
        if let Some(v) = self.initial_blur {
            extractor.initial_blur = v;
        }
        if let Some(v) = self.contrast_threshold {
            extractor.contrast_threshold = v;
        }
        if let Some(v) = self.curvature_threshold {
            extractor.curvature_threshold = v;
        }
        if let Some(v) = self.descriptor_threshold {
            extractor.descriptor_threshold = v;
        }
        config
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CliReport<'a> {
    #[serde(flatten)]
    output: &'a PipelineOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    recall: Option<&'a RecallListing>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let base = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    let config = cli.apply_to(base);

    let left = JsonKeypointSource::new(&cli.left).load(&config.extractor)?;
    let right = JsonKeypointSource::new(&cli.right).load(&config.extractor)?;
    let store = DescriptorStore::new(left, right).map_err(|e| e.to_string())?;

    let pipeline = HomographyPipeline::new(config);
    let output = pipeline.run(&store);
    let recall = if cli.list_all {
        pipeline.geometric_recall(&store, &output)
    } else {
        None
    };

    match &cli.out {
        Some(path) => {
            write_json_file(
                path,
                &CliReport {
                    output: &output,
                    recall: recall.as_ref(),
                },
            )?;
            println!("Report written to {}", path.display());
        }
        None => print_summary(&output, recall.as_ref()),
    }
    Ok(())
}

fn print_summary(output: &PipelineOutput, recall: Option<&RecallListing>) {
    let summary = &output.report.summary;
    println!(
        "Number of original features: {} {}",
        summary.left_points, summary.right_points
    );
    println!(
        "Number of matching features: {} {} {:.1}%",
        output.refined_inliers, output.ransac.inliers, summary.accepted_percent
    );
    match &output.homography {
        Some(h) => println!("Homography: {:?}", h.to_row_major()),
        None => println!("Homography: not found"),
    }

    if let Some(listing) = recall {
        for entry in listing.entries.iter().filter(|e| !e.candidates.is_empty()) {
            println!("{}:", entry.query);
            for c in &entry.candidates {
                let mark = if c.chosen { '*' } else { ' ' };
                println!(
                    "  {} {}: similarity={:.3} distance={:.1}",
                    mark, c.target, c.similarity, c.distance
                );
            }
        }
        println!("Number of founds: {}", listing.found);
    }

    for pair in &output.report.pairs {
        println!(
            "{}: score={:.3} ambiguity={:.3} match={} error={:.1} orient={:.0},{:.0} pos1=({:.0},{:.0}) delta=({:.1},{:.1})",
            pair.query,
            pair.score,
            pair.ambiguity,
            pair.target,
            pair.error,
            pair.left_orientation,
            pair.right_orientation,
            pair.left[0],
            pair.left[1],
            pair.delta[0],
            pair.delta[1]
        );
    }
}
