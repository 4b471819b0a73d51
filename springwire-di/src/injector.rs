//! Core functionality for resolving definitions into instances.
//!
//! The [Injector] selects a [Definition] for a requested interface and identifier, constructs
//! the registered class with resolved constructor arguments, applies the remaining calls in
//! declaration order and returns the instance. Each argument is delegated to the
//! [ArgumentResolver] registered for its kind, which might recursively request more instances.

use crate::argument::{
    default_argument_resolvers, ArgumentResolverPtr, ArgumentResolverRegistry, ResolutionContext,
};
use crate::class_registry::{ClassRegistry, Parameter};
use crate::config::{ConfigProviderPtr, MapConfigProvider};
use crate::container::{Container, DefinitionKey};
use crate::definition::{Argument, Definition, CONSTRUCTOR};
use crate::error::ResolutionError;
use crate::instance_provider::{Exclusions, InstanceProvider};
use crate::scope::{PrototypeScopeFactory, ScopeFactoryPtr, ScopePtr};
use crate::value::{InstancePtr, Value};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Builder for [Injector] with sensible defaults, for easy construction.
pub struct InjectorBuilder {
    container: Arc<Container>,
    classes: Arc<ClassRegistry>,
    config: ConfigProviderPtr,
    argument_resolvers: ArgumentResolverRegistry,
    scope_factory: ScopeFactoryPtr,
}

impl InjectorBuilder {
    /// Creates a new builder with all built-in argument kinds, an empty configuration and
    /// prototype scope.
    pub fn new<C: Into<Arc<Container>>, R: Into<Arc<ClassRegistry>>>(
        container: C,
        classes: R,
    ) -> Self {
        Self {
            container: container.into(),
            classes: classes.into(),
            config: Box::<MapConfigProvider>::default(),
            argument_resolvers: default_argument_resolvers(),
            scope_factory: Box::<PrototypeScopeFactory>::default(),
        }
    }

    /// Sets the configuration used by `config` arguments and parameterized identifiers.
    pub fn with_config(mut self, config: ConfigProviderPtr) -> Self {
        self.config = config;
        self
    }

    /// Registers a resolver for given argument kind, replacing any previous one.
    pub fn with_argument_resolver<T: ToString>(
        mut self,
        kind: T,
        resolver: ArgumentResolverPtr,
    ) -> Self {
        self.argument_resolvers.insert(kind.to_string(), resolver);
        self
    }

    /// Replaces all argument resolvers.
    pub fn with_argument_resolvers(mut self, argument_resolvers: ArgumentResolverRegistry) -> Self {
        self.argument_resolvers = argument_resolvers;
        self
    }

    /// Sets the factory for the scope deciding on instance reuse.
    pub fn with_scope_factory(mut self, scope_factory: ScopeFactoryPtr) -> Self {
        self.scope_factory = scope_factory;
        self
    }

    /// Builds resulting [Injector].
    pub fn build(self) -> Injector {
        Injector {
            container: self.container,
            classes: self.classes,
            config: self.config,
            argument_resolvers: self.argument_resolvers,
            scope: self.scope_factory.create_scope(),
        }
    }
}

/// Resolution engine creating instances from definitions stored in a [Container]. The container
/// is read-only, so a single injector can be shared between threads.
pub struct Injector {
    container: Arc<Container>,
    classes: Arc<ClassRegistry>,
    config: ConfigProviderPtr,
    argument_resolvers: ArgumentResolverRegistry,
    scope: ScopePtr,
}

struct BindError {
    argument: Option<String>,
    source: ResolutionError,
}

impl BindError {
    fn new(argument: &str, source: ResolutionError) -> Self {
        Self {
            argument: Some(argument.to_string()),
            source,
        }
    }

    fn in_call(
        self,
        key: &DefinitionKey,
        call_index: Option<usize>,
        method: &str,
    ) -> ResolutionError {
        ResolutionError::InCall {
            key: key.clone(),
            call_index,
            method: method.to_string(),
            argument: self.argument,
            source: Box::new(self.source),
        }
    }
}

impl Injector {
    /// Resolves an instance for given interface and optional identifier.
    #[inline]
    pub fn get(
        &self,
        interface: &str,
        identifier: Option<&str>,
    ) -> Result<InstancePtr, ResolutionError> {
        self.instance(interface, identifier, &Exclusions::default())
    }

    /// Returns all definitions for given interface.
    #[inline]
    pub fn definitions(&self, interface: &str) -> Option<&BTreeMap<Option<String>, Definition>> {
        self.container.definitions(interface)
    }

    #[inline]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    #[inline]
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// Returns registered argument resolvers, which can be reused for binding arguments outside
    /// of definitions.
    #[inline]
    pub fn argument_resolvers(&self) -> &ArgumentResolverRegistry {
        &self.argument_resolvers
    }

    /// Resolves a single argument with the resolver registered for its kind.
    pub fn resolve_argument(
        &self,
        argument: &Argument,
        exclude: &Exclusions,
    ) -> Result<Value, ResolutionError> {
        let resolver = self
            .argument_resolvers
            .get(&argument.kind)
            .ok_or_else(|| ResolutionError::UnknownArgumentKind(argument.kind.clone()))?;

        resolver.resolve(
            argument,
            &ResolutionContext {
                instances: self,
                config: self.config.as_ref(),
                classes: &self.classes,
                exclude,
            },
        )
    }

    fn select_definition(
        &self,
        interface: &str,
        identifier: Option<&str>,
        exclude: &Exclusions,
    ) -> Result<&Definition, ResolutionError> {
        let not_found = || ResolutionError::NotFound {
            interface: interface.to_string(),
            identifier: identifier.map(str::to_string),
        };

        let definitions = self
            .container
            .definitions(interface)
            .filter(|definitions| !definitions.is_empty())
            .ok_or_else(not_found)?;

        if let Some(identifier) = identifier {
            let key = DefinitionKey::new(interface, Some(identifier.to_string()));
            let definition = definitions.get(&key.identifier).ok_or_else(not_found)?;

            return if exclude.contains(&key) {
                Err(ResolutionError::DependencyCycle(key))
            } else {
                Ok(definition)
            };
        }

        let is_excluded = |definition: &Definition| {
            exclude.contains(&DefinitionKey::new(
                interface,
                definition.identifier.clone(),
            ))
        };

        if let Some(definition) = definitions.get(&None) {
            if !is_excluded(definition) {
                return Ok(definition);
            }
        }

        let mut candidates = definitions
            .values()
            .filter(|definition| !is_excluded(definition));

        if definitions.len() == 1 {
            return candidates.next().ok_or_else(|| {
                ResolutionError::DependencyCycle(DefinitionKey::new(
                    interface,
                    definitions.keys().next().cloned().flatten(),
                ))
            });
        }

        // resolving a dependency on the interface currently under construction
        if exclude.iter().any(|key| key.interface == interface) {
            return candidates
                .next()
                .ok_or_else(|| ResolutionError::AllCandidatesExcluded(interface.to_string()));
        }

        Err(ResolutionError::Ambiguous {
            interface: interface.to_string(),
            candidates: definitions
                .keys()
                .map(|identifier| identifier.clone().unwrap_or_default())
                .collect(),
        })
    }

    fn create_instance(
        &self,
        interface: &str,
        definition: &Definition,
        exclude: &Exclusions,
    ) -> Result<InstancePtr, ResolutionError> {
        let key = DefinitionKey::new(interface, definition.identifier.clone());
        if let Some(instance) = self.scope.instance(&key) {
            trace!(%key, "Reusing scoped instance");
            return Ok(instance);
        }

        debug!(%key, class = %definition.class_name, "Creating instance");

        let constructor = definition
            .calls
            .iter()
            .find_position(|call| call.is_constructor());

        let class = self.classes.class(&definition.class_name).ok_or_else(|| {
            BindError {
                argument: None,
                source: ResolutionError::UnknownClass(definition.class_name.clone()),
            }
            .in_call(&key, constructor.map(|(index, _)| index), CONSTRUCTOR)
        })?;

        // only pairs still pointing at this definition are being resolved
        let mut resolving = exclude.clone();
        resolving.extend(
            definition
                .interfaces
                .iter()
                .map(|interface| DefinitionKey::new(interface, definition.identifier.clone()))
                .filter(|candidate| {
                    self.container
                        .definition(&candidate.interface, candidate.identifier.as_deref())
                        == Some(definition)
                }),
        );
        resolving.insert(key.clone());

        let arguments = self
            .bind_arguments(
                &class.parameters,
                constructor
                    .map(|(_, call)| call.arguments.as_slice())
                    .unwrap_or_default(),
                &resolving,
            )
            .map_err(|error| {
                error.in_call(&key, constructor.map(|(index, _)| index), CONSTRUCTOR)
            })?;

        let mut instance = (class.constructor)(arguments).map_err(|error| {
            BindError {
                argument: None,
                source: error.into(),
            }
            .in_call(&key, constructor.map(|(index, _)| index), CONSTRUCTOR)
        })?;

        for (index, call) in definition.method_calls() {
            trace!(%key, method = %call.method, "Applying call");

            let arguments = self
                .bind_arguments(
                    class.method_parameters(&call.method),
                    &call.arguments,
                    &resolving,
                )
                .map_err(|error| error.in_call(&key, Some(index), &call.method))?;

            instance.call(&call.method, arguments).map_err(|error| {
                BindError {
                    argument: None,
                    source: error.into(),
                }
                .in_call(&key, Some(index), &call.method)
            })?;
        }

        let instance: InstancePtr = instance.into();
        self.scope.store_instance(&key, instance.clone());

        Ok(instance)
    }

    fn bind_arguments(
        &self,
        parameters: &[Parameter],
        arguments: &[Argument],
        exclude: &Exclusions,
    ) -> Result<Vec<Value>, BindError> {
        if parameters.is_empty() {
            return arguments
                .iter()
                .map(|argument| {
                    self.resolve_argument(argument, exclude)
                        .map_err(|error| BindError::new(&argument.name, error))
                })
                .try_collect();
        }

        if let Some(argument) = arguments.iter().find(|argument| {
            !parameters
                .iter()
                .any(|parameter| parameter.name == argument.name)
        }) {
            return Err(BindError::new(
                &argument.name,
                ResolutionError::UnexpectedArgument(argument.name.clone()),
            ));
        }

        parameters
            .iter()
            .map(|parameter| {
                match arguments
                    .iter()
                    .find(|argument| argument.name == parameter.name)
                {
                    Some(argument) => self.resolve_argument(argument, exclude),
                    None => self.resolve_unbound_parameter(parameter, exclude),
                }
                .map_err(|error| BindError::new(&parameter.name, error))
            })
            .try_collect()
    }

    fn resolve_unbound_parameter(
        &self,
        parameter: &Parameter,
        exclude: &Exclusions,
    ) -> Result<Value, ResolutionError> {
        match &parameter.interface {
            Some(interface) => {
                trace!(parameter = %parameter.name, %interface, "Resolving implicit dependency");

                match self.instance(interface, None, exclude) {
                    Ok(instance) => Ok(Value::Instance(instance)),
                    Err(ResolutionError::NotFound { .. }) if parameter.optional => Ok(Value::Null),
                    Err(error) => Err(error),
                }
            }
            None if parameter.optional => Ok(Value::Null),
            None => Err(ResolutionError::UnboundParameter(parameter.name.clone())),
        }
    }
}

impl InstanceProvider for Injector {
    fn instance(
        &self,
        interface: &str,
        identifier: Option<&str>,
        exclude: &Exclusions,
    ) -> Result<InstancePtr, ResolutionError> {
        trace!(interface, ?identifier, "Resolving instance");

        let definition = self.select_definition(interface, identifier, exclude)?;
        self.create_instance(interface, definition, exclude)
    }
}
