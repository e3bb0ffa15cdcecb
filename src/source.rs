//! Keypoint sources: the contract with the external feature extractor.
//!
//! The pipeline does not detect keypoints itself. An extractor runs with
//! [`ExtractorOptions`] and hands over a keypoint collection whose
//! descriptors are already L2-normalized and whose positions are in image
//! pixels. [`JsonKeypointSource`] reads such collections from keypoint files
//! written by an extractor run.
use crate::io::{read_json_file, write_json_file};
use crate::store::{KeypointSet, StoreError};
use crate::types::Keypoint;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Descriptor norms further than this from 1 trigger a warning.
const NORM_TOLERANCE: f32 = 1e-2;

/// Feature extractor parameters, as exposed on the command line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorOptions {
    /// Number of scale-space octaves.
    pub octaves: usize,
    /// Blur already present in the input image.
    pub initial_blur: f32,
    /// Minimum extremum contrast.
    pub contrast_threshold: f32,
    /// Maximum principal-curvature ratio (edge rejection).
    pub curvature_threshold: f32,
    /// Clamp on descriptor elements before renormalization.
    pub descriptor_threshold: f32,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            octaves: 5,
            initial_blur: 0.0,
            contrast_threshold: 5.0,
            curvature_threshold: 16.0,
            descriptor_threshold: 0.2,
        }
    }
}

/// Dimensions of the image a keypoint collection was extracted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: usize,
    pub height: usize,
}

/// On-disk keypoint collection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeypointFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInfo>,
    /// Extractor parameters the keypoints were produced with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<ExtractorOptions>,
    pub keypoints: Vec<Keypoint>,
}

impl KeypointFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        read_json_file(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        write_json_file(path, self)
    }
}

/// Anything able to deliver a keypoint collection for one image.
pub trait KeypointSource {
    fn load(&self, options: &ExtractorOptions) -> Result<KeypointSet, String>;
}

/// Reads a [`KeypointFile`] from disk.
#[derive(Clone, Debug)]
pub struct JsonKeypointSource {
    path: PathBuf,
}

impl JsonKeypointSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeypointSource for JsonKeypointSource {
    fn load(&self, options: &ExtractorOptions) -> Result<KeypointSet, String> {
        let file = KeypointFile::load(&self.path)?;
        if let Some(recorded) = &file.extractor {
            if recorded != options {
                warn!(
                    "{} was extracted with {:?}, requested {:?}",
                    self.path.display(),
                    recorded,
                    options
                );
            }
        }
        let off_norm = count_off_norm(&file.keypoints);
        if off_norm > 0 {
            warn!(
                "{}: {} of {} descriptors are not unit length",
                self.path.display(),
                off_norm,
                file.keypoints.len()
            );
        }
        KeypointSet::new(file.keypoints)
            .map_err(|e: StoreError| format!("Invalid keypoints in {}: {e}", self.path.display()))
    }
}

fn count_off_norm(keypoints: &[Keypoint]) -> usize {
    keypoints
        .iter()
        .filter(|kp| {
            let norm = kp.descriptor.iter().map(|v| v * v).sum::<f32>().sqrt();
            (norm - 1.0).abs() > NORM_TOLERANCE
        })
        .count()
}
