// Configuration
// Loads serialization settings from YAML files and environment overrides

pub mod error;

pub use error::{ConfigError, ConfigErrorKind};

use crate::context::{Image, SerializationSettings};

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a config file
pub const CONFIG_PATH_ENV: &str = "FLOWKIT_CONFIG";
pub const PROJECT_ENV: &str = "FLOWKIT_PROJECT";
pub const DOMAIN_ENV: &str = "FLOWKIT_DOMAIN";
pub const VERSION_ENV: &str = "FLOWKIT_VERSION";
/// Replaces the default image, `name=fqn:tag` or `fqn:tag`
pub const IMAGE_ENV: &str = "FLOWKIT_IMAGE";
pub const FAST_ENV: &str = "FLOWKIT_FAST";

/// Default config location (~/.flowkit/config.yaml)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".flowkit").join("config.yaml"))
}

/// Parse settings from YAML source
pub fn parse_settings(source: &str) -> Result<SerializationSettings, ConfigError> {
    serde_yaml::from_str(source).map_err(|e| ConfigError::from_yaml_error(&e, source))
}

/// Read and parse a settings file, then apply environment overrides
pub fn load_settings(path: &Path) -> Result<SerializationSettings, ConfigError> {
    let source = fs::read_to_string(path).map_err(|e| {
        ConfigError::io(format!("failed to read {}: {}", path.display(), e))
    })?;

    let settings = parse_settings(&source)?;
    debug!(path = %path.display(), project = %settings.project, "loaded serialization settings");

    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

/// Locate and load settings: an explicit path, then `FLOWKIT_CONFIG`, then the default path
pub fn resolve_settings(explicit: Option<&Path>) -> Result<SerializationSettings, ConfigError> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .or_else(default_config_path)
        .ok_or_else(|| ConfigError::not_found("no home directory to look for a config file in"))?;

    if !path.exists() {
        return Err(ConfigError::not_found(format!(
            "config file not found: {}",
            path.display()
        ))
        .with_suggestion(format!(
            "pass --config or set {} to a settings file",
            CONFIG_PATH_ENV
        )));
    }

    load_settings(&path)
}

/// Override settings fields from environment-style lookups
pub fn apply_env_overrides<F>(
    mut settings: SerializationSettings,
    lookup: F,
) -> Result<SerializationSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project) = lookup(PROJECT_ENV) {
        settings.project = project;
    }
    if let Some(domain) = lookup(DOMAIN_ENV) {
        settings.domain = domain;
    }
    if let Some(version) = lookup(VERSION_ENV) {
        settings.version = version;
    }
    if let Some(image) = lookup(IMAGE_ENV) {
        settings.image_config.default_image = Image::parse(&image)?;
    }
    if let Some(fast) = lookup(FAST_ENV) {
        settings.fast_serialization_settings.enabled = parse_flag(&fast).ok_or_else(|| {
            ConfigError::invalid_value(format!("{} must be true or false, got '{}'", FAST_ENV, fast))
        })?;
    }

    Ok(settings)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const SETTINGS_YAML: &str = r#"
project: test_proj
domain: test_domain
version: abc
image_config:
  default_image:
    name: name
    fqn: image
    tag: name
env:
  LOG_LEVEL: debug
fast_serialization_settings:
  enabled: true
"#;

    #[test]
    fn test_parse_settings() {
        let settings = parse_settings(SETTINGS_YAML).unwrap();

        assert_eq!(settings.project, "test_proj");
        assert_eq!(settings.domain, "test_domain");
        assert_eq!(settings.version, "abc");
        assert_eq!(settings.image_config.default_image.full(), "image:name");
        assert_eq!(settings.env.get("LOG_LEVEL").map(String::as_str), Some("debug"));
        assert!(settings.is_fast());
    }

    #[test]
    fn test_parse_settings_defaults() {
        let source = r#"
project: p
domain: d
version: v
image_config:
  default_image: {name: default, fqn: app, tag: v1}
"#;
        let settings = parse_settings(source).unwrap();
        assert!(settings.env.is_empty());
        assert!(!settings.is_fast());
        assert!(settings.image_config.images.is_empty());
    }

    #[test]
    fn test_parse_settings_reports_location() {
        let err = parse_settings("project: [unclosed\n").unwrap_err();
        assert!(err.line > 0);
        assert!(!err.context.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let settings = parse_settings(SETTINGS_YAML).unwrap();
        let env: HashMap<&str, &str> = [
            (PROJECT_ENV, "other_proj"),
            (IMAGE_ENV, "ghcr.io/org/app:v2"),
            (FAST_ENV, "false"),
        ]
        .into_iter()
        .collect();

        let settings =
            apply_env_overrides(settings, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.project, "other_proj");
        assert_eq!(settings.domain, "test_domain");
        assert_eq!(settings.image_config.default_image.full(), "ghcr.io/org/app:v2");
        assert!(!settings.is_fast());
    }

    #[test]
    fn test_env_override_rejects_bad_flag() {
        let settings = parse_settings(SETTINGS_YAML).unwrap();
        let err = apply_env_overrides(settings, |key| {
            (key == FAST_ENV).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::InvalidValue);
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SETTINGS_YAML.as_bytes()).unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.version, "abc");
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_settings(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::NotFound);
        assert!(err.suggestion.is_some());
    }
}
