use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn quarter_circle() -> String {
    let mut gcode = String::from("G90\nM82\nG0 X10 Y0 F6000\n");
    for step in 1..=9 {
        let a = (step as f64 * 10.0).to_radians();
        gcode.push_str(&format!(
            "G1 X{:.4} Y{:.4} E{:.5} F1200\n",
            10.0 * a.cos(),
            10.0 * a.sin(),
            step as f64 * 0.1
        ));
    }
    gcode
}

#[test]
fn test_welds_with_config_and_flags() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("part.gcode");
    let config = dir.path().join("arcweld.toml");
    fs::write(&source, quarter_circle()).unwrap();
    fs::write(&config, "resolution_mm = 0.02\nbuffer_size = 200\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_arcweld"))
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .arg("--buffer-size")
        .arg("100")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results["success"], true);
    assert_eq!(results["progress"]["arcs_created"], 1);

    let welded = fs::read_to_string(dir.path().join("part.aw.gcode")).unwrap();
    assert!(welded.contains("; resolution=0.02mm\n"));
    assert!(welded.contains("; buffer_size=100\n"));
}

#[test]
fn test_missing_source_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("arcweld.toml");
    fs::write(&config, "").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_arcweld"))
        .arg(dir.path().join("missing.gcode"))
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unable to read source file"), "{}", stdout);
}

#[test]
fn test_invalid_flag_value_rejected() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("part.gcode");
    let config = dir.path().join("arcweld.toml");
    fs::write(&source, quarter_circle()).unwrap();
    fs::write(&config, "").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_arcweld"))
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .arg("--resolution")
        .arg("0")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!dir.path().join("part.aw.gcode").exists());
}

#[test]
fn test_min_radius_flag_blocks_small_arcs() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("part.gcode");
    let config = dir.path().join("arcweld.toml");
    fs::write(&source, quarter_circle()).unwrap();
    fs::write(&config, "").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_arcweld"))
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .arg("--min-radius")
        .arg("20")
        .arg("--max-radius")
        .arg("100")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results["progress"]["arcs_created"], 0);
}

#[test]
fn test_source_as_target_is_refused() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("part.gcode");
    let config = dir.path().join("arcweld.toml");
    fs::write(&source, quarter_circle()).unwrap();
    fs::write(&config, "").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_arcweld"))
        .arg(&source)
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(&source).unwrap(), quarter_circle());
}
