//! Configuration loading from files and the environment.

use native_query::config::{ConfigLoader, ConfigurationError, NativeQueryConfig};
use native_query::constants::env;
use parking_lot::{const_mutex, Mutex};
use std::io::Write;
use std::path::PathBuf;

/// Serializes tests that set `NATIVE_QUERY_*` variables
static ENV_LOCK: Mutex<()> = const_mutex(());

fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_defaults_without_file() {
    let config = ConfigLoader::new(None).without_env_overrides().load().unwrap();

    assert_eq!(config, NativeQueryConfig::default());
    assert_eq!(config.template_root_directory, "nativeQuery");
    assert_eq!(config.template_file_suffix, "twig");
    assert!(config.enable_structured_type_mapping);
}

#[test]
fn test_load_toml_with_partial_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "native-query.toml",
        "[native-query]\ntemplate-file-suffix = \"sql\"\n",
    );

    let config = ConfigLoader::new(Some(path)).without_env_overrides().load().unwrap();

    assert_eq!(config.template_root_directory, "nativeQuery");
    assert_eq!(config.template_file_suffix, "sql");
}

#[test]
fn test_invalid_suffix_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "application.yaml",
        "native-query:\n  template-file-suffix: .sql\n",
    );

    let result = ConfigLoader::new(Some(path)).without_env_overrides().load();

    assert!(matches!(
        result,
        Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "template-file-suffix"
    ));
}

#[test]
fn test_environment_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "application.yaml",
        "native-query:\n  template-root-directory: queries\n",
    );

    let _guard = ENV_LOCK.lock();
    std::env::set_var(env::TEMPLATE_ROOT_DIRECTORY, "sql/templates");
    std::env::set_var(env::ENABLE_STRUCTURED_TYPE_MAPPING, "false");
    let result = ConfigLoader::new(Some(path)).load();
    std::env::remove_var(env::TEMPLATE_ROOT_DIRECTORY);
    std::env::remove_var(env::ENABLE_STRUCTURED_TYPE_MAPPING);

    let config = result.unwrap();
    assert_eq!(config.template_root_directory, "sql/templates");
    assert_eq!(config.template_file_suffix, "twig");
    assert!(!config.enable_structured_type_mapping);
}

#[test]
fn test_unparseable_structured_mapping_override_is_rejected() {
    let _guard = ENV_LOCK.lock();
    std::env::set_var(env::ENABLE_STRUCTURED_TYPE_MAPPING, "yes");
    let loaded = ConfigLoader::new(None).load();
    let from_env = NativeQueryConfig::from_environment();
    std::env::remove_var(env::ENABLE_STRUCTURED_TYPE_MAPPING);

    for result in [loaded, from_env] {
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { ref field, ref value, .. })
                if field == env::ENABLE_STRUCTURED_TYPE_MAPPING && value == "yes"
        ));
    }
}
