//! JSON helpers shared by the library loaders and the binaries.
//!
//! Every error message carries the offending path, so loaders can hand the
//! string straight to the user.
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Reads and parses a JSON document (configs, keypoint files).
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

/// Writes `value` as pretty JSON (reports, keypoint files). Missing parent
/// directories are created first.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to encode {} as JSON: {e}", path.display()))?;
    fs::write(path, text).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}
