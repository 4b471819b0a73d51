//! Argument resolution strategies. Each [Argument] carries a `kind`, which selects an
//! [ArgumentResolver] interpreting the argument `properties`:
//!
//! * [SCALAR] - `value`, optionally converted according to `type` (`string`, `int`, `float`,
//! `bool`)
//! * [ARRAY] - the whole property map
//! * [NULL] - always [Value::Null]
//! * [DEPENDENCY] - an instance of `interface`, optionally with given `id`; an id wrapped in
//! [PARAMETER_DELIMITER] is first looked up in the configuration
//! * [CALL] - result of calling `method` on an `interface` instance, static `method` of `class`
//! or free `function`
//! * [CONFIG] - configuration value for `key` or the `default` property
//!
//! New kinds can be added by registering more resolvers with the
//! [InjectorBuilder](crate::injector::InjectorBuilder).

use crate::class_registry::ClassRegistry;
use crate::config::ConfigProvider;
use crate::definition::Argument;
use crate::error::ResolutionError;
use crate::instance_provider::{Exclusions, InstanceProvider};
use crate::value::{InstancePtr, Value};
use fxhash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

pub const SCALAR: &str = "scalar";
pub const ARRAY: &str = "array";
pub const NULL: &str = "null";
pub const DEPENDENCY: &str = "dependency";
pub const CALL: &str = "call";
pub const CONFIG: &str = "config";

/// Marker wrapping identifiers which should be looked up in the configuration, e.g.
/// `%db.default%`.
pub const PARAMETER_DELIMITER: char = '%';

pub type ArgumentResolverPtr = Arc<dyn ArgumentResolver + Send + Sync>;

pub type ArgumentResolverRegistry = FxHashMap<String, ArgumentResolverPtr>;

/// Everything a resolver might need: a way to resolve nested instances, configuration, known
/// classes and the set of definitions currently under construction.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub instances: &'a dyn InstanceProvider,
    pub config: &'a dyn ConfigProvider,
    pub classes: &'a ClassRegistry,
    pub exclude: &'a Exclusions,
}

/// Strategy converting a declared argument into a runtime value.
pub trait ArgumentResolver {
    fn resolve(
        &self,
        argument: &Argument,
        context: &ResolutionContext<'_>,
    ) -> Result<Value, ResolutionError>;
}

/// Returns resolvers for all built-in argument kinds.
pub fn default_argument_resolvers() -> ArgumentResolverRegistry {
    [
        (SCALAR, Arc::new(ScalarArgumentResolver) as ArgumentResolverPtr),
        (ARRAY, Arc::new(ArrayArgumentResolver) as ArgumentResolverPtr),
        (NULL, Arc::new(NullArgumentResolver) as ArgumentResolverPtr),
        (DEPENDENCY, Arc::new(DependencyArgumentResolver) as ArgumentResolverPtr),
        (CALL, Arc::new(CallArgumentResolver) as ArgumentResolverPtr),
        (CONFIG, Arc::new(ConfigArgumentResolver) as ArgumentResolverPtr),
    ]
    .into_iter()
    .map(|(kind, resolver)| (kind.to_string(), resolver))
    .collect()
}

fn required_property<'a>(argument: &'a Argument, property: &str) -> Result<&'a str, ResolutionError> {
    argument
        .property(property)
        .ok_or_else(|| ResolutionError::MissingProperty {
            kind: argument.kind.clone(),
            property: property.to_string(),
        })
}

/// Returns the value converted according to the optional `type` property.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct ScalarArgumentResolver;

impl ArgumentResolver for ScalarArgumentResolver {
    fn resolve(
        &self,
        argument: &Argument,
        _context: &ResolutionContext<'_>,
    ) -> Result<Value, ResolutionError> {
        let value = required_property(argument, "value")?;
        let value_type = argument.property("type").unwrap_or("string");

        let invalid = || ResolutionError::InvalidScalar {
            value: value.to_string(),
            value_type: value_type.to_string(),
        };

        match value_type {
            "string" => Ok(Value::String(value.to_string())),
            "int" => value.parse().map(Value::Int).map_err(|_| invalid()),
            "float" => value.parse().map(Value::Float).map_err(|_| invalid()),
            "bool" => value.parse().map(Value::Bool).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct ArrayArgumentResolver;

impl ArgumentResolver for ArrayArgumentResolver {
    fn resolve(
        &self,
        argument: &Argument,
        _context: &ResolutionContext<'_>,
    ) -> Result<Value, ResolutionError> {
        Ok(Value::Map(argument.properties.clone()))
    }
}

#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct NullArgumentResolver;

impl ArgumentResolver for NullArgumentResolver {
    fn resolve(
        &self,
        _argument: &Argument,
        _context: &ResolutionContext<'_>,
    ) -> Result<Value, ResolutionError> {
        Ok(Value::Null)
    }
}

/// Resolves nested instances through the [InstanceProvider] from the context.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct DependencyArgumentResolver;

impl DependencyArgumentResolver {
    pub fn resolve_instance(
        &self,
        argument: &Argument,
        context: &ResolutionContext<'_>,
    ) -> Result<InstancePtr, ResolutionError> {
        let interface = required_property(argument, "interface")?;
        let identifier = argument
            .property("id")
            .map(|identifier| resolve_identifier(identifier, context.config))
            .transpose()?;

        trace!(interface, ?identifier, "Resolving dependency argument");

        context
            .instances
            .instance(interface, identifier.as_deref(), context.exclude)
    }
}

impl ArgumentResolver for DependencyArgumentResolver {
    fn resolve(
        &self,
        argument: &Argument,
        context: &ResolutionContext<'_>,
    ) -> Result<Value, ResolutionError> {
        self.resolve_instance(argument, context).map(Value::Instance)
    }
}

/// Returns the identifier itself, or the configuration value if the identifier is wrapped in
/// [PARAMETER_DELIMITER].
pub fn resolve_identifier(
    identifier: &str,
    config: &dyn ConfigProvider,
) -> Result<String, ResolutionError> {
    match identifier
        .strip_prefix(PARAMETER_DELIMITER)
        .and_then(|identifier| identifier.strip_suffix(PARAMETER_DELIMITER))
    {
        Some(key) if !key.is_empty() => config
            .value(key)
            .ok_or_else(|| ResolutionError::MissingConfigKey(key.to_string())),
        _ => Ok(identifier.to_string()),
    }
}

/// Calls an argument-less method and returns its result.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct CallArgumentResolver;

impl ArgumentResolver for CallArgumentResolver {
    fn resolve(
        &self,
        argument: &Argument,
        context: &ResolutionContext<'_>,
    ) -> Result<Value, ResolutionError> {
        if let Some(interface) = argument.property("interface") {
            let method = argument
                .property("method")
                .ok_or_else(|| ResolutionError::MissingMethod(interface.to_string()))?;

            let instance = DependencyArgumentResolver.resolve_instance(argument, context)?;
            return Ok(instance.query(method)?);
        }

        if let Some(class) = argument.property("class") {
            let method = argument
                .property("method")
                .ok_or_else(|| ResolutionError::MissingMethod(class.to_string()))?;

            return Ok((context.classes.static_method(class, method)?)()?);
        }

        if let Some(function) = argument.property("function") {
            return Ok((context.classes.function(function)?)()?);
        }

        Err(ResolutionError::MissingCallTarget)
    }
}

/// Returns a configuration value, falling back to the `default` property and then to
/// [Value::Null].
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct ConfigArgumentResolver;

impl ArgumentResolver for ConfigArgumentResolver {
    fn resolve(
        &self,
        argument: &Argument,
        context: &ResolutionContext<'_>,
    ) -> Result<Value, ResolutionError> {
        let key = required_property(argument, "key")?;
        Ok(context
            .config
            .value_or(key, argument.property("default").map(str::to_string))
            .into())
    }
}
