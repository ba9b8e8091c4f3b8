//! Build-type configuration tests

use hpipe_build::{resolve_configuration, BuildError, BuildType, Target, TargetKind};
use hpipe_config::GlobalConfig;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[rstest]
#[case("Debug", BuildType::Debug, "debug")]
#[case("debug", BuildType::Debug, "debug")]
#[case("RELEASE", BuildType::Release, "release")]
#[case("Release", BuildType::Release, "release")]
fn test_resolve_configuration(
    #[case] name: &str,
    #[case] expected: BuildType,
    #[case] dir: &str,
) {
    let config = resolve_configuration(name, "/work/build").unwrap();
    assert_eq!(config.build_type, expected);
    assert_eq!(config.output_root, Path::new("/work/build").join(dir));
    assert_eq!(
        config.intermediate_root,
        Path::new("/work/build/obj").join(dir)
    );
}

#[rstest]
#[case("")]
#[case("Profile")]
#[case("RelWithDebInfo")]
fn test_unknown_build_type(#[case] name: &str) {
    let err = resolve_configuration(name, "build").unwrap_err();
    assert!(matches!(err, BuildError::UnknownBuildType(ref n) if n == name));
    assert!(err.is_structural());
}

#[test]
fn test_debug_and_release_policies_differ() {
    let debug = resolve_configuration("Debug", "build").unwrap();
    let release = resolve_configuration("Release", "build").unwrap();

    assert!(!debug.optimize);
    assert!(debug.debug_symbols);
    assert!(release.optimize);
    assert!(!release.debug_symbols);
    assert!(debug.flags.contains(&"-g".to_string()));
    assert!(release.flags.contains(&"-DNDEBUG".to_string()));
}

#[test]
fn test_flags_from_global_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[flags]
release = ["-O3", "-march=native"]
"#,
    )
    .unwrap();
    let global = GlobalConfig::load_from_file(&path).unwrap();

    let mut release = resolve_configuration("Release", "build").unwrap();
    release.merge_with_global(&global);
    let mut debug = resolve_configuration("Debug", "build").unwrap();
    debug.merge_with_global(&global);

    assert_eq!(release.flags, vec!["-O3", "-march=native"]);
    assert_eq!(debug.flags, BuildType::Debug.default_flags());
}

#[test]
fn test_artifact_lands_in_output_root() {
    let config = resolve_configuration("Debug", "out").unwrap();
    let target = Target::new("softrast", TargetKind::Executable, vec![PathBuf::from("main.cpp")]);

    assert_eq!(
        config.artifact_path(&target),
        PathBuf::from("out/debug").join(format!("softrast{}", std::env::consts::EXE_SUFFIX))
    );
}
