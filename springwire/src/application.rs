//! Core application bootstrapping functionality.
//!
//! An [Application] is an explicit context object: it reads framework configuration, builds the
//! definition reader chain and creates the [Injector], which should then be passed to all
//! consumers which need to resolve instances.

use crate::cache::{clear_cache, CacheError, CachedDefinitionReader};
use crate::config::{ApplicationConfig, SettingsConfigProvider};
use crate::locator::ModuleFileLocator;
use crate::reader::{DefinitionReader, DefinitionReaderPtr, FileDefinitionReader, ReaderError};
use config::{Config, ConfigError};
use derive_more::Constructor;
use springwire_di::class_registry::ClassRegistry;
use springwire_di::injector::{Injector, InjectorBuilder};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Error reading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Error reading definitions: {0}")]
    Reader(#[from] ReaderError),
    #[error("Error clearing definition cache: {0}")]
    Cache(#[from] CacheError),
}

/// Main entrypoint for the application. Reads definitions and creates the [Injector].
#[derive(Constructor)]
pub struct Application {
    config: ApplicationConfig,
    settings: Config,
    classes: Arc<ClassRegistry>,
}

impl Application {
    /// Creates an application configured from the default config file and environment.
    pub fn from_environment(classes: ClassRegistry) -> Result<Self, ApplicationError> {
        let settings = ApplicationConfig::load_settings()?;
        let config = ApplicationConfig::from_settings(&settings)?;
        Ok(Self::new(config, settings, Arc::new(classes)))
    }

    #[inline]
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Creates the reader for all module definition files, optionally behind the cache.
    pub fn definition_reader(&self) -> DefinitionReaderPtr {
        let reader = FileDefinitionReader::new(
            ModuleFileLocator::new(
                self.config.module_paths.clone(),
                self.config.environment.clone(),
            ),
            self.config.definitions_file.clone(),
        );

        match &self.config.cache_path {
            Some(cache_path) => Box::new(CachedDefinitionReader::new(reader, cache_path.clone())),
            None => Box::new(reader),
        }
    }

    /// Reads all definitions and creates an [Injector] for them.
    pub fn injector(&self) -> Result<Injector, ApplicationError> {
        if self.config.install_tracing_logger {
            install_tracing_logger();
        }

        info!("Reading definitions...");

        let container = self.definition_reader().read_container()?;

        debug!(definitions = container.len(), "Creating injector");

        Ok(InjectorBuilder::new(container, self.classes.clone())
            .with_config(Box::new(SettingsConfigProvider::new(self.settings.clone())))
            .build())
    }

    /// Removes cached definitions, if caching is enabled.
    pub fn clear_cache(&self) -> Result<(), ApplicationError> {
        if let Some(cache_path) = &self.config.cache_path {
            clear_cache(cache_path)?;
        }

        Ok(())
    }
}

fn install_tracing_logger() {
    // another subscriber might already be installed by the host
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

#[cfg(test)]
mod tests {
    use crate::application::Application;
    use crate::config::ApplicationConfig;
    use config::{Config, File, FileFormat};
    use springwire_di::class_registry::ClassRegistry;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    fn create_application(root: &Path, cache: bool) -> Application {
        let settings = Config::builder()
            .add_source(File::from_str(
                &format!(
                    r#"{{
                        "install_tracing_logger": false,
                        "module_paths": [{:?}],
                        "environment": "test",
                        "cache_path": {},
                        "app": {{ "name": "test" }}
                    }}"#,
                    root.display().to_string(),
                    if cache {
                        format!("{:?}", root.join("cache.json").display().to_string())
                    } else {
                        "null".to_string()
                    }
                ),
                FileFormat::Json,
            ))
            .build()
            .unwrap();

        let config = ApplicationConfig::from_settings(&settings).unwrap();
        Application::new(config, settings, Arc::new(ClassRegistry::default()))
    }

    fn write_definitions(root: &Path) {
        fs::create_dir_all(root.join("test")).unwrap();
        fs::write(
            root.join("dependencies.json"),
            r#"{ "definitions": [{ "interfaces": ["X"], "class": "Base" }] }"#,
        )
        .unwrap();
        fs::write(
            root.join("test").join("dependencies.json"),
            r#"{ "definitions": [{ "interfaces": ["X"], "class": "Overridden" }] }"#,
        )
        .unwrap();
    }

    #[test]
    fn should_read_environment_definitions() {
        let dir = tempfile::tempdir().unwrap();
        write_definitions(dir.path());

        let application = create_application(dir.path(), false);
        let injector = application.injector().unwrap();

        assert_eq!(
            injector.container().definition("X", None).unwrap().class_name,
            "Overridden"
        );
    }

    #[test]
    fn should_write_and_clear_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_definitions(dir.path());

        let application = create_application(dir.path(), true);
        let cache_path = application.config().cache_path.clone().unwrap();

        application.injector().unwrap();
        assert!(cache_path.is_file());

        application.clear_cache().unwrap();
        assert!(!cache_path.exists());
    }

    #[test]
    fn should_ignore_clear_without_cache() {
        let dir = tempfile::tempdir().unwrap();
        let application = create_application(dir.path(), false);

        application.clear_cache().unwrap();
    }
}
