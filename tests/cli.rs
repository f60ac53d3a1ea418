use std::process::{Command, Output};

fn centile_engine(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_centile_engine"))
        .args(args)
        .env_remove("CENTILE_DATA_ROOT")
        .env_remove("CENTILE_MIN_MINUTES")
        .env_remove("CENTILE_COMPETITIONS")
        .output()
        .unwrap()
}

#[test]
fn malformed_season_is_a_usage_error() {
    let out = centile_engine(&["rebuild", "--season", "2024"]);
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("24_25"), "{stderr}");
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    assert_eq!(centile_engine(&["recompute"]).status.code(), Some(3));
}

#[test]
fn help_and_version_succeed() {
    let help = centile_engine(&["--help"]);
    assert_eq!(help.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&help.stdout).contains("rebuild"));

    let version = centile_engine(&["--version"]);
    assert_eq!(version.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&version.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn empty_data_root_exits_with_input_missing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();
    let out = centile_engine(&["--data-root", root, "rebuild", "--season", "24_25"]);
    assert_eq!(out.status.code(), Some(1));
}
