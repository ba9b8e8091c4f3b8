//! Configuration loading, precedence and environment store tests

use hpipe_config::{ConfigError, ConfigLoader, EnvMap, EnvStore, GlobalConfig, TomlEnvStore};
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join("config.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

fn clear_env() {
    env::remove_var("HPIPE_BUILD_TYPE");
    env::remove_var("HPIPE_OUTPUT_DIR");
    env::remove_var("HPIPE_CC");
}

// ============================================================================
// Global Config Tests
// ============================================================================

#[test]
fn test_load_global_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        r#"
[defaults]
build_type = "Release"
output_dir = "out"

[flags]
release = ["-O3", "-flto"]
"#,
    );

    let config = GlobalConfig::load_from_file(&path).unwrap();

    assert_eq!(config.default_build_type(), Some("Release"));
    assert_eq!(config.output_dir(), Some(Path::new("out")));
    assert_eq!(config.flags_for("release").map(|f| f.len()), Some(2));
    assert!(config.flags_for("debug").is_none());
}

#[test]
fn test_load_missing_file_reports_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let result = GlobalConfig::load_from_file(&temp_dir.path().join("nope.toml"));

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[defaults\nbuild_type = ");

    let result = GlobalConfig::load_from_file(&path);
    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[rstest]
#[case("Debug")]
#[case("debug")]
#[case("RELEASE")]
fn test_build_type_case_insensitive(#[case] build_type: &str) {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        &format!("[defaults]\nbuild_type = \"{}\"\n", build_type),
    );

    assert!(GlobalConfig::load_from_file(&path).is_ok());
}

#[test]
fn test_empty_toolchain_program_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[toolchain]\nprogram = \"  \"\n");

    let result = GlobalConfig::load_from_file(&path);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        r#"
[defaults]
build_type = "Debug"

[toolchain]
program = "clang"
"#,
    );

    env::set_var("HPIPE_BUILD_TYPE", "Release");
    env::set_var("HPIPE_CC", "/opt/cc");

    let config = ConfigLoader::new()
        .with_global_config_path(path)
        .load()
        .unwrap();

    assert_eq!(config.default_build_type(), Some("Release"));
    assert_eq!(config.toolchain_program(), Some("/opt/cc"));

    clear_env();
}

#[test]
#[serial]
fn test_file_values_kept_without_env() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        r#"
[toolchain]
program = "clang"
output_flag = "/Fe:"
"#,
    );

    let config = ConfigLoader::new()
        .with_global_config_path(path)
        .load()
        .unwrap();

    let toolchain = config.toolchain.unwrap();
    assert_eq!(toolchain.program.as_deref(), Some("clang"));
    assert_eq!(toolchain.output_flag.as_deref(), Some("/Fe:"));
    assert!(toolchain.include_flag.is_none());
}

// ============================================================================
// Environment Store Tests
// ============================================================================

#[test]
fn test_env_store_overwrites_previous_values() {
    let temp_dir = TempDir::new().unwrap();
    let store = TomlEnvStore::in_dir(temp_dir.path());

    let mut first = EnvMap::new();
    first.insert("CC".to_string(), "gcc".to_string());
    first.insert("STALE".to_string(), "1".to_string());
    store.save_env(&first).unwrap();

    let mut second = EnvMap::new();
    second.insert("CC".to_string(), "clang".to_string());
    store.save_env(&second).unwrap();

    let loaded = store.load_env().unwrap();
    assert_eq!(loaded.get("CC").map(String::as_str), Some("clang"));
    assert!(!loaded.contains_key("STALE"));
}

#[test]
fn test_env_store_file_name() {
    let store = TomlEnvStore::in_dir("build");
    assert_eq!(store.path(), Path::new("build").join(".hpipe-env.toml"));
}
