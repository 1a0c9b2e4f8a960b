use std::{path::PathBuf, process::Command};

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gaugecast"))
}

fn scratch_dir() -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn help_lists_the_core_flags() {
    let out = bin().arg("--help").output().unwrap();
    assert!(out.status.success());
    let help = String::from_utf8_lossy(&out.stdout);
    for flag in ["--in", "--start", "--end", "--out"] {
        assert!(help.contains(flag), "missing {flag} in help output");
    }
}

#[test]
fn malformed_sample_document_fails_cleanly() {
    let doc = scratch_dir().join("garbage.json");
    std::fs::write(&doc, b"this is not json").unwrap();

    let out = bin()
        .args(["--in"])
        .arg(&doc)
        .args(["--start", "2023-05-01T06:00:00Z", "--end", "2023-05-01T07:00:00Z"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("malformed input"), "stderr: {stderr}");
}

#[test]
fn reversed_window_is_rejected_before_any_work() {
    let doc = scratch_dir().join("one_sample.json");
    std::fs::write(
        &doc,
        br#"[{"time": "2023-05-01T06:30:00Z", "power": 100, "hr": 120}]"#,
    )
    .unwrap();

    let out = bin()
        .args(["--in"])
        .arg(&doc)
        .args(["--start", "2023-05-01T07:00:00Z", "--end", "2023-05-01T06:00:00Z"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid time window"), "stderr: {stderr}");
}

#[test]
fn unparsable_window_bound_is_rejected_by_clap() {
    let doc = scratch_dir().join("one_sample2.json");
    std::fs::write(
        &doc,
        br#"[{"time": "2023-05-01T06:30:00Z", "power": 100, "hr": 120}]"#,
    )
    .unwrap();

    let out = bin()
        .args(["--in"])
        .arg(&doc)
        .args(["--start", "sometime", "--end", "2023-05-01T07:00:00Z"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unrecognized timestamp"), "stderr: {stderr}");
}
