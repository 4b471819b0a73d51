//! Reading definitions from overlapping definition files.
//!
//! Every module can provide its own definitions file. A [FileDefinitionReader] locates all files
//! with the same logical name and applies them from the least to the most specific, so
//! definitions from more specific files override the ones declared before them for the same
//! (interface, identifier) pair.
//!
//! Definition files use the following JSON format:
//!
//! ```json
//! {
//!     "definitions": [
//!         {
//!             "interfaces": ["LoggerInterface"],
//!             "class": "Logger",
//!             "id": "file",
//!             "calls": [
//!                 {
//!                     "method": "__construct",
//!                     "arguments": [
//!                         { "name": "level", "kind": "scalar", "value": "debug" }
//!                     ]
//!                 }
//!             ]
//!         },
//!         {
//!             "extends": "LoggerInterface#file",
//!             "id": "audit",
//!             "calls": [
//!                 {
//!                     "method": "setName",
//!                     "arguments": [{ "name": "name", "kind": "scalar", "value": "audit" }]
//!                 }
//!             ]
//!         }
//!     ]
//! }
//! ```
//!
//! All argument attributes other than `name` and `kind` become argument properties. Numbers and
//! booleans given as `value` are tagged with a matching `type` property, so `scalar` arguments
//! keep their native type.

use crate::locator::FileLocator;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use springwire_di::container::{Container, DefinitionDeclaration, DefinitionKey};
use springwire_di::definition::{Argument, Call};
use springwire_di::error::{ContainerError, DefinitionError};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors related to reading definitions.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Cannot read definition file {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Cannot parse definition file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid definition in {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("Cannot apply definition from {}: {source}", .path.display())]
    Container {
        path: PathBuf,
        source: ContainerError,
    },
}

/// Source of a complete [Container].
#[cfg_attr(test, automock)]
pub trait DefinitionReader {
    fn read_container(&self) -> Result<Container, ReaderError>;
}

pub type DefinitionReaderPtr = Box<dyn DefinitionReader + Send + Sync>;

impl<R: DefinitionReader + ?Sized> DefinitionReader for Box<R> {
    #[inline]
    fn read_container(&self) -> Result<Container, ReaderError> {
        (**self).read_container()
    }
}

/// Reads definition files with given name found by a [FileLocator].
#[derive(Clone, Debug)]
pub struct FileDefinitionReader<L: FileLocator> {
    locator: L,
    file_name: PathBuf,
}

impl<L: FileLocator> FileDefinitionReader<L> {
    pub fn new<P: Into<PathBuf>>(locator: L, file_name: P) -> Self {
        Self {
            locator,
            file_name: file_name.into(),
        }
    }
}

impl<L: FileLocator> DefinitionReader for FileDefinitionReader<L> {
    fn read_container(&self) -> Result<Container, ReaderError> {
        let mut container = Container::default();

        // most specific files come first, so they need to be applied last
        for path in self.locator.locate(&self.file_name).into_iter().rev() {
            info!(path = %path.display(), "Reading definitions");
            read_definitions(&path, &mut container)?;
        }

        Ok(container)
    }
}

/// Applies all definitions from given file to the container.
pub fn read_definitions(path: &Path, container: &mut Container) -> Result<(), ReaderError> {
    let content = fs::read_to_string(path).map_err(|source| ReaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let declarations = parse_definitions(&content).map_err(|error| match error {
        ParseError::Json(source) => ReaderError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ParseError::Malformed(message) => ReaderError::Malformed {
            path: path.to_path_buf(),
            message,
        },
        ParseError::Definition(source) => ReaderError::Container {
            path: path.to_path_buf(),
            source: source.into(),
        },
    })?;

    debug!(path = %path.display(), count = declarations.len(), "Applying definitions");

    for declaration in declarations {
        container
            .declare(declaration)
            .map_err(|source| ReaderError::Container {
                path: path.to_path_buf(),
                source,
            })?;
    }

    Ok(())
}

/// Errors when parsing definition file content.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Malformed(String),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Parses definition file content into declarations, in file order.
pub fn parse_definitions(content: &str) -> Result<Vec<DefinitionDeclaration>, ParseError> {
    serde_json::from_str::<DefinitionFile>(content)?
        .definitions
        .into_iter()
        .map(DefinitionEntry::into_declaration)
        .collect()
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    #[serde(default)]
    definitions: Vec<DefinitionEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionEntry {
    #[serde(default)]
    interfaces: Vec<String>,
    class: Option<String>,
    id: Option<String>,
    extends: Option<String>,
    #[serde(default)]
    calls: Vec<CallEntry>,
}

impl DefinitionEntry {
    fn into_declaration(self) -> Result<DefinitionDeclaration, ParseError> {
        if self.class.is_none() && self.extends.is_none() {
            return Err(ParseError::Malformed(format!(
                "definition {:?} for interfaces {:?} declares neither class nor extends",
                self.id, self.interfaces
            )));
        }

        Ok(DefinitionDeclaration {
            interfaces: self.interfaces,
            identifier: self.id,
            class_name: self.class,
            extends: self
                .extends
                .as_deref()
                .map(DefinitionKey::parse)
                .transpose()?,
            calls: self
                .calls
                .into_iter()
                .map(CallEntry::into_call)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CallEntry {
    method: String,
    id: Option<String>,
    #[serde(default)]
    arguments: Vec<ArgumentEntry>,
}

impl CallEntry {
    fn into_call(self) -> Result<Call, ParseError> {
        Ok(Call {
            arguments: self
                .arguments
                .into_iter()
                .map(|argument| argument.into_argument(&self.method))
                .collect::<Result<_, _>>()?,
            method: self.method,
            call_id: self.id,
        })
    }
}

#[derive(Deserialize)]
struct ArgumentEntry {
    name: String,
    kind: String,
    #[serde(flatten)]
    properties: BTreeMap<String, serde_json::Value>,
}

impl ArgumentEntry {
    fn into_argument(self, method: &str) -> Result<Argument, ParseError> {
        let mut argument = Argument::new(self.name, self.kind);

        for (key, value) in self.properties {
            let (value, value_type) = match value {
                serde_json::Value::String(value) => (value, None),
                serde_json::Value::Bool(value) => (value.to_string(), Some("bool")),
                serde_json::Value::Number(value) if value.is_f64() => {
                    (value.to_string(), Some("float"))
                }
                serde_json::Value::Number(value) => (value.to_string(), Some("int")),
                value => {
                    return Err(ParseError::Malformed(format!(
                        "argument {} of {method} has unsupported value for property {key}: {value}",
                        argument.name
                    )))
                }
            };

            if key == "value" {
                if let Some(value_type) = value_type {
                    argument
                        .properties
                        .entry("type".to_string())
                        .or_insert_with(|| value_type.to_string());
                }
            }

            argument.properties.insert(key, value);
        }

        Ok(argument)
    }
}
