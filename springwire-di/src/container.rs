//! The definition store. A [Container] maps interface names to definitions, indexed by their
//! optional identifier, with at most one definition per (interface, identifier) pair. Adding a
//! definition for an existing pair overrides the previous one, which is how overlays take
//! precedence.

use crate::definition::{Call, Definition};
use crate::error::{ContainerError, DefinitionError};
use fxhash::FxHashMap;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use tracing::trace;

/// Separator between interface and identifier in textual definition references.
pub const REFERENCE_SEPARATOR: char = '#';

/// Identity of a definition - an (interface, identifier) pair.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct DefinitionKey {
    pub interface: String,
    pub identifier: Option<String>,
}

impl DefinitionKey {
    pub fn new<T: ToString>(interface: T, identifier: Option<String>) -> Self {
        Self {
            interface: interface.to_string(),
            identifier,
        }
    }

    /// Parses `interface#identifier` or `interface` (for the default slot).
    pub fn parse(reference: &str) -> Result<Self, DefinitionError> {
        let (interface, identifier) = match reference.split_once(REFERENCE_SEPARATOR) {
            Some((interface, identifier)) => (interface, Some(identifier)),
            None => (reference, None),
        };

        if interface.is_empty() || identifier.map(str::is_empty).unwrap_or(false) {
            return Err(DefinitionError::InvalidReference(reference.to_string()));
        }

        Ok(Self::new(interface, identifier.map(str::to_string)))
    }
}

impl Display for DefinitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.identifier {
            Some(identifier) => write!(f, "{}{REFERENCE_SEPARATOR}{identifier}", self.interface),
            None => write!(f, "{}", self.interface),
        }
    }
}

/// A raw declaration, as produced by a definition file parser, before it becomes a
/// [Definition].
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct DefinitionDeclaration {
    /// Declared interfaces. When empty, the class name (or the base interfaces, when extending)
    /// is used.
    pub interfaces: Vec<String>,
    pub identifier: Option<String>,
    pub class_name: Option<String>,
    pub extends: Option<DefinitionKey>,
    pub calls: Vec<Call>,
}

/// Store of all known definitions.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Container {
    definitions: FxHashMap<String, BTreeMap<Option<String>, Definition>>,
}

impl Container {
    /// Adds a definition for given interface, overriding any previous one with the same
    /// identifier.
    pub fn add_definition<T: ToString>(&mut self, interface: T, definition: Definition) {
        let interface = interface.to_string();

        trace!(
            %interface,
            identifier = ?definition.identifier,
            class = %definition.class_name,
            "Adding definition"
        );

        self.definitions
            .entry(interface)
            .or_default()
            .insert(definition.identifier.clone(), definition);
    }

    /// Adds a definition for each of its interfaces.
    pub fn register(&mut self, definition: Definition) {
        for interface in definition.interfaces.clone() {
            self.add_definition(interface, definition.clone());
        }
    }

    /// Turns a declaration into a [Definition] and registers it. When extending, the base is
    /// looked up in the current state of the container.
    pub fn declare(
        &mut self,
        declaration: DefinitionDeclaration,
    ) -> Result<Definition, ContainerError> {
        let mut definition = match &declaration.extends {
            Some(base_key) => self
                .definition(&base_key.interface, base_key.identifier.as_deref())
                .ok_or_else(|| ContainerError::MissingBaseDefinition(base_key.clone()))?
                .derive(declaration.identifier, declaration.class_name)?,
            None => Definition::new(
                declaration
                    .class_name
                    .filter(|class_name| !class_name.is_empty())
                    .ok_or_else(|| DefinitionError::MissingClass {
                        identifier: declaration.identifier.clone(),
                    })?,
                declaration.identifier,
            )?,
        };

        if !declaration.interfaces.is_empty() {
            definition = definition.with_interfaces(declaration.interfaces);
        } else if let Some(base_key) = &declaration.extends {
            if !definition.interfaces.contains(&base_key.interface) {
                definition.interfaces.push(base_key.interface.clone());
            }
        }

        for call in declaration.calls {
            definition.apply_call(call);
        }

        self.register(definition.clone());
        Ok(definition)
    }

    /// Returns all definitions for given interface, in deterministic order: the default one
    /// first, followed by the rest ordered by identifier.
    pub fn definitions(&self, interface: &str) -> Option<&BTreeMap<Option<String>, Definition>> {
        self.definitions.get(interface)
    }

    pub fn definition(&self, interface: &str, identifier: Option<&str>) -> Option<&Definition> {
        self.definitions.get(interface).and_then(|definitions| {
            definitions.get(&identifier.map(str::to_string))
        })
    }

    #[inline]
    pub fn contains(&self, key: &DefinitionKey) -> bool {
        self.definition(&key.interface, key.identifier.as_deref())
            .is_some()
    }

    /// Returns all registered interfaces in sorted order.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str).sorted()
    }

    /// Returns all (interface, definition) pairs, ordered by interface and identifier.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Definition)> {
        self.definitions
            .iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .flat_map(|(interface, definitions)| {
                definitions
                    .values()
                    .map(move |definition| (interface.as_str(), definition))
            })
    }

    /// Total number of (interface, identifier) pairs.
    pub fn len(&self) -> usize {
        self.definitions.values().map(BTreeMap::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> FromIterator<(&'a str, Definition)> for Container {
    fn from_iter<T: IntoIterator<Item = (&'a str, Definition)>>(iter: T) -> Self {
        let mut container = Self::default();
        for (interface, definition) in iter {
            container.add_definition(interface, definition);
        }

        container
    }
}
