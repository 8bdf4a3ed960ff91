pub mod loader;
pub mod schema;

pub use loader::{
    apply_env_overrides, default_settings_path, load_settings, load_settings_from_str,
    validate_settings, SettingsFormat,
};
pub use schema::{
    BatchSettings, EventSettings, GatewaySettings, LogFormat, LoggingSettings,
    NormalizerSettings, Settings,
};
