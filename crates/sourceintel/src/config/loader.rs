use std::path::{Path, PathBuf};

use crate::config::schema::{Settings, SETTINGS_VERSION};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/settings-v1.json");

/// Overrides the campaign id from the environment.
pub const CAMPAIGN_ID_ENV_VAR: &str = "SOURCEINTEL_CAMPAIGN_ID";

/// Overrides the gateway base URL from the environment.
pub const GATEWAY_URL_ENV_VAR: &str = "SOURCEINTEL_GATEWAY_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Yaml,
}

impl SettingsFormat {
    /// `.yaml`/`.yml` select YAML, anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => SettingsFormat::Yaml,
            _ => SettingsFormat::Json,
        }
    }
}

/// `<config dir>/sourceintel/settings.json`, if the platform has a config
/// directory.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sourceintel").join("settings.json"))
}

/// Loads, validates and env-overrides settings from a file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut settings = load_settings_from_str(&content, SettingsFormat::from_path(path))?;
    apply_env_overrides(&mut settings);
    validate_settings(&settings)?;
    Ok(settings)
}

/// Parses and validates settings without consulting the environment.
pub fn load_settings_from_str(
    content: &str,
    format: SettingsFormat,
) -> Result<Settings, ConfigError> {
    let json_value: serde_json::Value = match format {
        SettingsFormat::Json => serde_json::from_str(content)?,
        SettingsFormat::Yaml => serde_yaml::from_str(content)?,
    };

    validate_schema(&json_value)?;

    let settings: Settings = serde_json::from_value(json_value)?;

    validate_settings(&settings)?;

    Ok(settings)
}

/// Applies `SOURCEINTEL_*` environment overrides. Empty values are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(campaign_id) = env_value(CAMPAIGN_ID_ENV_VAR) {
        log::debug!("Campaign id overridden from {}", CAMPAIGN_ID_ENV_VAR);
        settings.campaign_id = campaign_id;
    }
    if let Some(base_url) = env_value(GATEWAY_URL_ENV_VAR) {
        log::debug!("Gateway URL overridden from {}", GATEWAY_URL_ENV_VAR);
        settings.gateway.base_url = base_url;
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Checks rules the schema cannot express.
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.version != SETTINGS_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported settings version: {}", settings.version),
        });
    }

    if settings.gateway.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "gateway.timeoutSecs must be greater than zero".to_string(),
        });
    }

    match url::Url::parse(&settings.gateway.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(ConfigError::Validation {
                message: format!("gateway.baseUrl must be http(s), got '{}'", url.scheme()),
            })
        }
        Err(e) => {
            return Err(ConfigError::Validation {
                message: format!("gateway.baseUrl is not a valid URL: {}", e),
            })
        }
    }

    let fallback = settings.normalizer.confidence_fallback;
    if !(0.0..=1.0).contains(&fallback) {
        return Err(ConfigError::Validation {
            message: format!("normalizer.confidenceFallback must be in [0, 1], got {}", fallback),
        });
    }

    if settings.events.capacity == 0 {
        return Err(ConfigError::Validation {
            message: "events.capacity must be greater than zero".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use crate::gateway::AnalysisType;
    use assert_fs::prelude::*;
    use serial_test::serial;

    #[test]
    fn test_load_minimal_json() {
        let settings = load_settings_from_str(
            r#"{"version":"1.0","campaignId":"camp-1"}"#,
            SettingsFormat::Json,
        )
        .unwrap();
        assert_eq!(settings.campaign_id, "camp-1");
        assert_eq!(settings.gateway.timeout_secs, 45);
    }

    #[test]
    fn test_load_full_yaml() {
        let yaml = r#"
version: "1.0"
campaignId: spring-launch
gateway:
  baseUrl: https://intel.example.com
  timeoutSecs: 30
  tokenEnvVar: INTEL_TOKEN
  defaultAnalysisType: competitive
"#;
        // `competitive` is not an analysis type
        assert!(matches!(
            load_settings_from_str(yaml, SettingsFormat::Yaml),
            Err(ConfigError::SchemaValidation { .. })
        ));

        let yaml = yaml.replace("competitive", "comprehensive");
        let settings = load_settings_from_str(&yaml, SettingsFormat::Yaml).unwrap();
        assert_eq!(settings.gateway.base_url, "https://intel.example.com");
        assert_eq!(settings.gateway.timeout_secs, 30);
        assert_eq!(settings.gateway.token_env_var.as_deref(), Some("INTEL_TOKEN"));
        assert_eq!(
            settings.gateway.default_analysis_type,
            AnalysisType::Comprehensive
        );
    }

    #[test]
    fn test_unknown_field_rejected_by_schema() {
        let result = load_settings_from_str(r#"{"batch":{"delay":5}}"#, SettingsFormat::Json);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let result = load_settings_from_str(
            r#"{"normalizer":{"confidenceFallback":1.5}}"#,
            SettingsFormat::Json,
        );
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_bad_version_rejected() {
        let result = load_settings_from_str(r#"{"version":"2.0"}"#, SettingsFormat::Json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let result = load_settings_from_str(
            r#"{"gateway":{"baseUrl":"ftp://files.example.com"}}"#,
            SettingsFormat::Json,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));

        let result =
            load_settings_from_str(r#"{"gateway":{"baseUrl":"nope"}}"#, SettingsFormat::Json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let result = load_settings_from_str("{", SettingsFormat::Json);
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SettingsFormat::from_path(Path::new("a/settings.yml")),
            SettingsFormat::Yaml
        );
        assert_eq!(
            SettingsFormat::from_path(Path::new("settings.json")),
            SettingsFormat::Json
        );
        assert_eq!(SettingsFormat::from_path(Path::new("settings")), SettingsFormat::Json);
    }

    #[test]
    #[serial]
    fn test_load_file_with_env_overrides() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("settings.yaml");
        file.write_str("campaignId: from-file\nlogging:\n  format: json\n")
            .unwrap();

        std::env::set_var(CAMPAIGN_ID_ENV_VAR, "from-env");
        std::env::set_var(GATEWAY_URL_ENV_VAR, "https://gateway.internal");
        let settings = load_settings(file.path());
        std::env::remove_var(CAMPAIGN_ID_ENV_VAR);
        std::env::remove_var(GATEWAY_URL_ENV_VAR);

        let settings = settings.unwrap();
        assert_eq!(settings.campaign_id, "from-env");
        assert_eq!(settings.gateway.base_url, "https://gateway.internal");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_invalid_env_override_fails_validation() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("settings.json");
        file.write_str("{}").unwrap();

        std::env::set_var(GATEWAY_URL_ENV_VAR, "not a url");
        let result = load_settings(file.path());
        std::env::remove_var(GATEWAY_URL_ENV_VAR);

        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = load_settings("/nonexistent/sourceintel/settings.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_default_settings_path_shape() {
        if let Some(path) = default_settings_path() {
            assert!(path.ends_with("sourceintel/settings.json"));
        }
    }
}
