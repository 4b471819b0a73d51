use crate::container::DefinitionKey;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Shared pointer to an error raised by user code, e.g. a constructor or a registered function.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Malformed or incomplete declaration of a single definition.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum DefinitionError {
    #[error("Definition has an empty class name")]
    EmptyClassName,
    #[error("Definition for class {0} has an empty identifier")]
    EmptyIdentifier(String),
    #[error("Definition with identifier {identifier:?} declares neither a class nor a base to extend")]
    MissingClass { identifier: Option<String> },
    #[error("Invalid definition reference: '{0}'")]
    InvalidReference(String),
}

/// Errors related to building the definition store.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ContainerError {
    #[error("No base definition for interface {} with identifier {:?}", .0.interface, .0.identifier)]
    MissingBaseDefinition(DefinitionKey),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Errors raised by [Wired](crate::value::Wired) types and registered functions.
#[derive(Error, Clone, Debug)]
pub enum CallError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
    #[error("Invalid arguments for {method}: {message}")]
    InvalidArguments { method: String, message: String },
    #[error("Call failed: {0}")]
    Failed(ErrorPtr),
}

/// Errors related to resolving definitions into instances.
#[derive(Error, Clone, Debug)]
pub enum ResolutionError {
    #[error("Cannot find a definition for interface {interface} with identifier {identifier:?}")]
    NotFound {
        interface: String,
        identifier: Option<String>,
    },
    #[error("Cannot select a definition for interface {interface} - multiple candidates exist without a default: {candidates:?}")]
    Ambiguous {
        interface: String,
        candidates: Vec<String>,
    },
    #[error("Every definition for interface {0} is currently being resolved")]
    AllCandidatesExcluded(String),
    #[error("Detected a dependency cycle on interface {} with identifier {:?}", .0.interface, .0.identifier)]
    DependencyCycle(DefinitionKey),
    #[error("Unknown class: {0}")]
    UnknownClass(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Unknown static method {method} of class {class}")]
    UnknownStaticMethod { class: String, method: String },
    #[error("Unknown argument kind: {0}")]
    UnknownArgumentKind(String),
    #[error("Argument of kind {kind} is missing required property: {property}")]
    MissingProperty { kind: String, property: String },
    #[error("Call argument declares neither an interface, a class nor a function")]
    MissingCallTarget,
    #[error("Call argument targeting {0} declares no method")]
    MissingMethod(String),
    #[error("Cannot find configuration key: {0}")]
    MissingConfigKey(String),
    #[error("Cannot convert '{value}' to {value_type}")]
    InvalidScalar { value: String, value_type: String },
    #[error("No argument bound to parameter {0}")]
    UnboundParameter(String),
    #[error("Argument {0} does not match any declared parameter")]
    UnexpectedArgument(String),
    #[error("Instance of class {class} is not of the requested type {expected}")]
    IncompatibleInstance { class: String, expected: String },
    #[error("Expected an instance, but argument resolved to a plain value")]
    NotAnInstance,
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("Error resolving {key} in {method}{}{}: {source}",
        .call_index.map(|index| format!(" (call #{index})")).unwrap_or_default(),
        .argument.as_ref().map(|name| format!(", argument {name}")).unwrap_or_default())]
    InCall {
        key: DefinitionKey,
        /// Index in the declared call list, or `None` for an undeclared constructor.
        call_index: Option<usize>,
        method: String,
        argument: Option<String>,
        #[source]
        source: Box<ResolutionError>,
    },
}
