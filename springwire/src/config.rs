//! Framework configuration is read with the [config] crate. By default, the config is created with
//! opinionated default values, which can then be overwritten by environment variables prefixed
//! with `SPRINGWIRE_` or `springwire.json` file. The same settings are exposed to definitions
//! through [SettingsConfigProvider], so `config` arguments and `%key%` identifiers can refer to
//! any value from the file.

use config::{Config, ConfigError, Environment, File};
use derive_more::Constructor;
use serde::Deserialize;
use springwire_di::config::ConfigProvider;
use std::path::PathBuf;

const CONFIG_ENV_PREFIX: &str = "SPRINGWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "springwire.json";

/// Name of the default definitions file, looked up in every module path.
pub const DEFINITIONS_FILE: &str = "dependencies.json";

/// Framework configuration.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct ApplicationConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Module directories containing definition files, most specific first.
    pub module_paths: Vec<PathBuf>,
    /// Active environment. Definition files in `<module path>/<environment>` take precedence
    /// over the ones in module paths.
    pub environment: Option<String>,
    /// Logical name of definition files.
    pub definitions_file: PathBuf,
    /// Location of the definition cache. Caching is disabled when not set.
    pub cache_path: Option<PathBuf>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            module_paths: vec![PathBuf::from(".")],
            environment: None,
            definitions_file: PathBuf::from(DEFINITIONS_FILE),
            cache_path: None,
        }
    }
}

impl From<OptionalApplicationConfig> for ApplicationConfig {
    fn from(value: OptionalApplicationConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            module_paths: value.module_paths.unwrap_or(default.module_paths),
            environment: value.environment.or(default.environment),
            definitions_file: value.definitions_file.unwrap_or(default.definitions_file),
            cache_path: value.cache_path.or(default.cache_path),
        }
    }
}

impl ApplicationConfig {
    /// Loads raw settings from the default config file and environment.
    pub fn load_settings() -> Result<Config, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
    }

    /// Extracts framework configuration from raw settings.
    pub fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        settings
            .clone()
            .try_deserialize::<OptionalApplicationConfig>()
            .map(|config| config.into())
    }
}

/// [ConfigProvider] backed by raw [Config] settings. Keys use the `config` crate path syntax,
/// e.g. `db.default`.
#[derive(Clone, Debug, Constructor)]
pub struct SettingsConfigProvider {
    settings: Config,
}

impl ConfigProvider for SettingsConfigProvider {
    fn value(&self, key: &str) -> Option<String> {
        self.settings.get_string(key).ok()
    }
}

#[derive(Deserialize)]
struct OptionalApplicationConfig {
    install_tracing_logger: Option<bool>,
    module_paths: Option<Vec<PathBuf>>,
    environment: Option<String>,
    definitions_file: Option<PathBuf>,
    cache_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use crate::config::{ApplicationConfig, SettingsConfigProvider, DEFINITIONS_FILE};
    use config::{Config, File, FileFormat};
    use springwire_di::config::ConfigProvider;
    use std::path::PathBuf;

    fn settings(json: &str) -> Config {
        Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()
            .unwrap()
    }

    #[test]
    fn should_use_defaults_for_missing_values() {
        let config = ApplicationConfig::from_settings(&settings("{}")).unwrap();

        assert!(config.install_tracing_logger);
        assert_eq!(config.module_paths, vec![PathBuf::from(".")]);
        assert_eq!(config.environment, None);
        assert_eq!(config.definitions_file, PathBuf::from(DEFINITIONS_FILE));
        assert_eq!(config.cache_path, None);
    }

    #[test]
    fn should_read_values() {
        let config = ApplicationConfig::from_settings(&settings(
            r#"{
                "install_tracing_logger": false,
                "module_paths": ["app", "vendor/core"],
                "environment": "dev",
                "cache_path": "var/cache/dependencies.json"
            }"#,
        ))
        .unwrap();

        assert!(!config.install_tracing_logger);
        assert_eq!(
            config.module_paths,
            vec![PathBuf::from("app"), PathBuf::from("vendor/core")]
        );
        assert_eq!(config.environment.as_deref(), Some("dev"));
        assert_eq!(
            config.cache_path,
            Some(PathBuf::from("var/cache/dependencies.json"))
        );
    }

    #[test]
    fn should_provide_nested_values() {
        let provider = SettingsConfigProvider::new(settings(
            r#"{ "db": { "default": "main", "port": 5432 } }"#,
        ));

        assert_eq!(provider.value("db.default"), Some("main".to_string()));
        assert_eq!(provider.value("db.port"), Some("5432".to_string()));
        assert_eq!(provider.value("db.missing"), None);
    }
}
