use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_guidelint"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "guidelint init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".guidelint.toml");
    assert!(config_path.exists(), ".guidelint.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[llm]"));
    assert!(content.contains("[review]"));

    let _config: guidelint_core::GuidelintConfig = toml::from_str(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".guidelint.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_guidelint"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert_eq!(std::fs::read_to_string(dir.path().join(".guidelint.toml")).unwrap(), "# existing");
}
