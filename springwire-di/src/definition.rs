//! Wiring definitions - immutable descriptions of buildable entities. A [Definition] names the
//! class to instantiate, the interfaces it satisfies and an ordered list of [Call]s. The call
//! named [CONSTRUCTOR] supplies constructor arguments, while all others are invoked on the new
//! instance in declaration order.

use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the call supplying constructor arguments.
pub const CONSTRUCTOR: &str = "__construct";

/// One parameter to resolve. The `kind` selects the
/// [ArgumentResolver](crate::argument::ArgumentResolver) interpreting the `properties`.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Argument {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Argument {
    pub fn new<N: ToString, K: ToString>(name: N, kind: K) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            properties: Default::default(),
        }
    }

    /// Adds a property, replacing any previous value.
    pub fn with_property<K: ToString, V: ToString>(mut self, key: K, value: V) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    #[inline]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// One invocation - either the constructor or a method called after construction.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Call {
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    /// Optional identifier letting an extending definition replace this particular call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl Call {
    pub fn new<M: ToString>(method: M) -> Self {
        Self {
            method: method.to_string(),
            arguments: vec![],
            call_id: None,
        }
    }

    pub fn constructor() -> Self {
        Self::new(CONSTRUCTOR)
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_call_id<T: ToString>(mut self, call_id: T) -> Self {
        self.call_id = Some(call_id.to_string());
        self
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.method == CONSTRUCTOR
    }
}

/// Definition of a single buildable entity.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Definition {
    pub class_name: String,
    pub identifier: Option<String>,
    pub interfaces: Vec<String>,
    pub calls: Vec<Call>,
}

impl Definition {
    /// Creates a definition with no calls, satisfying only its own class as an interface.
    pub fn new<C: ToString>(
        class_name: C,
        identifier: Option<String>,
    ) -> Result<Self, DefinitionError> {
        let class_name = class_name.to_string();
        if class_name.is_empty() {
            return Err(DefinitionError::EmptyClassName);
        }

        if identifier.as_ref().map(|id| id.is_empty()).unwrap_or(false) {
            return Err(DefinitionError::EmptyIdentifier(class_name));
        }

        Ok(Self {
            interfaces: vec![class_name.clone()],
            class_name,
            identifier,
            calls: vec![],
        })
    }

    /// Replaces the interface list. An empty list falls back to the class name.
    pub fn with_interfaces<I: IntoIterator<Item = T>, T: ToString>(mut self, interfaces: I) -> Self {
        self.interfaces = interfaces.into_iter().map(|i| i.to_string()).collect();
        if self.interfaces.is_empty() {
            self.interfaces.push(self.class_name.clone());
        }

        self
    }

    pub fn with_call(mut self, call: Call) -> Self {
        self.apply_call(call);
        self
    }

    /// Returns the constructor call, if declared.
    pub fn constructor(&self) -> Option<&Call> {
        self.calls.iter().find(|call| call.is_constructor())
    }

    /// Returns all non-constructor calls with their index in the declared call list.
    pub fn method_calls(&self) -> impl Iterator<Item = (usize, &Call)> {
        self.calls
            .iter()
            .enumerate()
            .filter(|(_, call)| !call.is_constructor())
    }

    /// Appends a call, unless it carries a `call_id` matching an existing call - such call is
    /// replaced in place.
    pub fn apply_call(&mut self, call: Call) {
        if let Some(call_id) = &call.call_id {
            if let Some(existing) = self
                .calls
                .iter_mut()
                .find(|existing| existing.call_id.as_ref() == Some(call_id))
            {
                *existing = call;
                return;
            }
        }

        self.calls.push(call);
    }

    /// Creates an independent copy used as the base of an extending definition.
    pub(crate) fn derive(
        &self,
        identifier: Option<String>,
        class_name: Option<String>,
    ) -> Result<Self, DefinitionError> {
        let class_name = class_name.unwrap_or_else(|| self.class_name.clone());
        let mut derived = Self::new(class_name, identifier)?;
        derived.interfaces = self.interfaces.clone();
        derived.calls = self.calls.clone();
        Ok(derived)
    }
}
