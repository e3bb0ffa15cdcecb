use crate::io::read_json_file;
use crate::synthetic::SceneSpec;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
pub struct SyntheticOutputConfig {
    pub left: PathBuf,
    pub right: PathBuf,
    /// Ground truth: homography, correspondence mapping and outlier indices.
    #[serde(default)]
    pub truth_json: Option<PathBuf>,
}

/// Config of the `synthetic_pair` tool.
#[derive(Clone, Debug, Deserialize)]
pub struct SyntheticPairConfig {
    #[serde(default)]
    pub scene: SceneSpec,
    pub output: SyntheticOutputConfig,
}

pub fn load_config(path: &Path) -> Result<SyntheticPairConfig, String> {
    read_json_file(path).map_err(|e| format!("Failed to load config: {e}"))
}
