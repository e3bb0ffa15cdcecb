use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kph-cli-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn matcher_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_keypoint-homography"))
}

/// Writes a left/right keypoint file pair via the `synthetic_pair` tool.
fn synthetic_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let left = dir.join("left.json");
    let right = dir.join("right.json");
    let config = dir.join("scene.json");
    let json = serde_json::json!({
        "scene": {
            "points": 40,
            "outliers": 8,
            "descriptor_len": 32,
            "seed": 12,
            "homography": [1.0, 0.0, 6.0, 0.0, 1.0, -4.0, 0.0, 0.0, 1.0]
        },
        "output": { "left": left, "right": right }
    });
    fs::write(&config, json.to_string()).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_synthetic_pair"))
        .arg(&config)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    (left, right)
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[test]
fn missing_right_path_prints_usage_and_exits_1() {
    let out = matcher_bin().arg("left.json").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage:"), "stderr: {stderr}");
}

#[test]
fn unreadable_keypoint_file_exits_1() {
    let out = matcher_bin()
        .args(["/nonexistent/left.json", "/nonexistent/right.json"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error:"));
}

#[test]
fn synthetic_pair_is_matched() {
    let dir = scratch_dir("match");
    let (left, right) = synthetic_pair(&dir);

    let out = matcher_bin()
        .args(["--seed", "1"])
        .arg(&left)
        .arg(&right)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("Number of original features: 40 40"), "{text}");
    assert!(text.contains("Number of matching features: 32 32 80.0%"), "{text}");

    let report = dir.join("report.json");
    let out = matcher_bin()
        .args(["--seed", "1", "--list-all"])
        .arg(&left)
        .arg(&right)
        .arg(&report)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(doc["report"]["summary"]["accepted"], 32);
    assert!(doc["recall"]["entries"].is_array());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn config_gates_apply_without_match_ratio_flag() {
    let dir = scratch_dir("config");
    let (left, right) = synthetic_pair(&dir);
    let config = dir.join("pipeline.json");
    fs::write(
        &config,
        r#"{"matcher":{"match_ratio":0.5},"ransac":{"gate":{"min_score":2.0}},"refine":{"gate":{"min_score":2.0}}}"#,
    )
    .unwrap();

    let out = matcher_bin()
        .arg("--config")
        .arg(&config)
        .args(["--seed", "1"])
        .arg(&left)
        .arg(&right)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("Homography: not found"), "{text}");
    assert!(text.contains("Number of matching features: 0 0 0.0%"), "{text}");

    let _ = fs::remove_dir_all(&dir);
}
