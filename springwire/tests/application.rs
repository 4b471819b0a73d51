use config::{Config, File, FileFormat};
use springwire::application::Application;
use springwire::cache::CachedDefinitionReader;
use springwire::config::ApplicationConfig;
use springwire::locator::ModuleFileLocator;
use springwire::reader::{DefinitionReader, FileDefinitionReader};
use springwire_di::class_registry::{ClassMetadata, ClassRegistry, Parameter};
use springwire_di::error::CallError;
use springwire_di::instance_provider::TypedInstanceProvider;
use springwire_di::value::{Value, Wired};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Logger {
    level: String,
    name: Option<String>,
}

impl Wired for Logger {
    fn call(&mut self, method: &str, arguments: Vec<Value>) -> Result<(), CallError> {
        match method {
            "setName" => {
                self.name = arguments
                    .first()
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(())
            }
            _ => Err(CallError::UnknownMethod(method.to_string())),
        }
    }
}

struct Mailer {
    retries: i64,
    logger: Arc<Logger>,
}

impl Wired for Mailer {}

fn create_classes() -> ClassRegistry {
    let mut classes = ClassRegistry::default();
    classes.register_class(
        "Logger",
        ClassMetadata::new(|arguments| {
            Ok(Box::new(Logger {
                level: arguments
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or("info")
                    .to_string(),
                name: None,
            }))
        })
        .with_parameter(Parameter::new("level").optional()),
    );
    classes.register_class(
        "Mailer",
        ClassMetadata::new(|arguments| {
            let invalid = |message: &str| CallError::InvalidArguments {
                method: "__construct".to_string(),
                message: message.to_string(),
            };

            Ok(Box::new(Mailer {
                retries: arguments
                    .first()
                    .and_then(Value::as_i64)
                    .ok_or_else(|| invalid("retries must be an integer"))?,
                logger: arguments
                    .get(1)
                    .ok_or_else(|| invalid("missing logger"))?
                    .instance_of::<Logger>()
                    .map_err(|error| invalid(&error.to_string()))?,
            }))
        })
        .with_parameter(Parameter::new("retries"))
        .with_parameter(Parameter::typed("logger", "LoggerInterface")),
    );
    classes
}

fn write(path: PathBuf, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

// "app" overrides "core", and the "prod" environment overrides both
fn write_modules(root: &Path) -> (PathBuf, PathBuf) {
    let app = root.join("app");
    let core = root.join("core");

    write(
        core.join("dependencies.json"),
        r#"{ "definitions": [
            {
                "interfaces": ["LoggerInterface"],
                "class": "Logger",
                "id": "base",
                "calls": [{
                    "method": "__construct",
                    "arguments": [{ "name": "level", "kind": "scalar", "value": "info" }]
                }]
            },
            { "extends": "LoggerInterface#base" },
            {
                "interfaces": ["MailerInterface"],
                "class": "Mailer",
                "calls": [{
                    "method": "__construct",
                    "arguments": [{ "name": "retries", "kind": "scalar", "value": 1 }]
                }]
            }
        ] }"#,
    );
    write(
        app.join("dependencies.json"),
        r#"{ "definitions": [
            {
                "extends": "LoggerInterface#base",
                "calls": [{
                    "method": "setName",
                    "arguments": [{ "name": "name", "kind": "config", "key": "app.name" }]
                }]
            }
        ] }"#,
    );
    write(
        core.join("prod").join("dependencies.json"),
        r#"{ "definitions": [
            {
                "interfaces": ["MailerInterface"],
                "class": "Mailer",
                "calls": [{
                    "method": "__construct",
                    "arguments": [{ "name": "retries", "kind": "scalar", "value": 5 }]
                }]
            }
        ] }"#,
    );

    (app, core)
}

fn create_settings(modules: &[PathBuf], environment: &str, cache_path: &Path) -> Config {
    let modules = modules
        .iter()
        .map(|path| format!("{:?}", path.display().to_string()))
        .collect::<Vec<_>>()
        .join(", ");

    Config::builder()
        .add_source(File::from_str(
            &format!(
                r#"{{
                    "install_tracing_logger": false,
                    "module_paths": [{modules}],
                    "environment": {environment:?},
                    "cache_path": {:?},
                    "app": {{ "name": "mailing" }}
                }}"#,
                cache_path.display().to_string()
            ),
            FileFormat::Json,
        ))
        .build()
        .unwrap()
}

#[test]
fn should_merge_module_overlays() {
    let dir = tempfile::tempdir().unwrap();
    let (app, core) = write_modules(dir.path());

    let container = FileDefinitionReader::new(
        ModuleFileLocator::new(vec![app, core], Some("prod".to_string())),
        "dependencies.json",
    )
    .read_container()
    .unwrap();

    let logger = container.definition("LoggerInterface", None).unwrap();
    assert_eq!(logger.class_name, "Logger");
    assert_eq!(logger.calls.len(), 2);
    assert_eq!(logger.calls[1].method, "setName");

    let mailer = container.definition("MailerInterface", None).unwrap();
    assert_eq!(
        mailer.constructor().unwrap().arguments[0].property("value"),
        Some("5")
    );
}

#[test]
fn should_read_same_definitions_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let (app, core) = write_modules(dir.path());
    let cache_path = dir.path().join("var").join("definitions.json");

    let create_reader = || {
        CachedDefinitionReader::new(
            FileDefinitionReader::new(
                ModuleFileLocator::new(vec![app.clone(), core.clone()], None),
                "dependencies.json",
            ),
            &cache_path,
        )
    };

    let built = create_reader().read_container().unwrap();

    // definitions are no longer read once cached
    fs::remove_dir_all(&app).unwrap();
    fs::remove_dir_all(&core).unwrap();

    assert_eq!(create_reader().read_container().unwrap(), built);
}

#[test]
fn should_resolve_instances_from_application() {
    let dir = tempfile::tempdir().unwrap();
    let (app, core) = write_modules(dir.path());
    let cache_path = dir.path().join("definitions.json");

    let settings = create_settings(&[app, core], "prod", &cache_path);
    let application = Application::new(
        ApplicationConfig::from_settings(&settings).unwrap(),
        settings,
        Arc::new(create_classes()),
    );

    let injector = application.injector().unwrap();

    let logger = injector
        .typed_instance::<Logger>("LoggerInterface", None)
        .unwrap();
    assert_eq!(logger.level, "info");
    assert_eq!(logger.name.as_deref(), Some("mailing"));

    let mailer = injector
        .typed_instance::<Mailer>("MailerInterface", None)
        .unwrap();
    assert_eq!(mailer.retries, 5);
    assert_eq!(mailer.logger.name.as_deref(), Some("mailing"));
    assert!(cache_path.is_file());

    // the cached container resolves the same graph
    let cached = application.injector().unwrap();
    let mailer = cached
        .typed_instance::<Mailer>("MailerInterface", None)
        .unwrap();
    assert_eq!(mailer.retries, 5);
}
