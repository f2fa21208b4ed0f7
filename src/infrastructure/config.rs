use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "config/snapshot";
const ENV_PREFIX: &str = "SNAPSHOT";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub snapshots: SnapshotSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotSettings {
    /// Directory holding one `<id>.json` document per snapshot.
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSettings {
    /// Sorted `order` values must be consecutive integers.
    #[serde(default)]
    pub require_contiguous_order: bool,
    /// `metadata.totalWidgets` must match the widget count instead of only being logged.
    #[serde(default)]
    pub reject_metadata_drift: bool,
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("snapshots.directory", "snapshots")?
        .set_default("validation.require_contiguous_order", false)?
        .set_default("validation.reject_metadata_drift", false)?)
}

/// `SNAPSHOT_VALIDATION__REJECT_METADATA_DRIFT=true` sets `validation.reject_metadata_drift`.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Defaults, then `config/snapshot.{toml,json,yaml}` if present, then `SNAPSHOT_*` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_layered(environment())
}

fn load_layered(environment: config::Environment) -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
        .add_source(environment)
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Loads a specific file on top of the defaults; the file must exist.
pub fn load_app_config_from(path: &Path) -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::from(path))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_app_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[snapshots]\ndirectory = \"/var/lib/dashboards\"\n\n[validation]\nrequire_contiguous_order = true"
        )
        .unwrap();

        let config = load_app_config_from(file.path()).unwrap();
        assert_eq!(config.snapshots.directory, PathBuf::from("/var/lib/dashboards"));
        assert!(config.validation.require_contiguous_order);
        assert!(!config.validation.reject_metadata_drift);
    }

    #[test]
    fn test_defaults_apply_to_empty_file() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let config = load_app_config_from(file.path()).unwrap();
        assert_eq!(config.snapshots.directory, PathBuf::from("snapshots"));
        assert_eq!(config.validation, ValidationSettings::default());
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        let variables = [
            ("SNAPSHOT_VALIDATION__REJECT_METADATA_DRIFT", "true"),
            ("SNAPSHOT_SNAPSHOTS__DIRECTORY", "/srv/snapshots"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let config = load_layered(environment().source(Some(variables))).unwrap();
        assert!(config.validation.reject_metadata_drift);
        assert!(!config.validation.require_contiguous_order);
        assert_eq!(config.snapshots.directory, PathBuf::from("/srv/snapshots"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_app_config_from(Path::new("/nonexistent/snapshot.toml")).is_err());
    }
}
