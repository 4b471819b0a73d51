//! Instances are created through [Scope]s - containers which decide whether to reuse or create an
//! instance. By default, the [Injector](crate::injector::Injector) uses [PrototypeScope], which
//! creates a new instance on every request. Applications wanting to memoize instances by
//! (interface, identifier) can opt into [SingletonScope] or provide their own implementation.
//!
//! Note: scope resolution happens at instantiation time, which means a memoized instance keeps
//! whatever dependencies it was created with, even if they come from a definition which would
//! otherwise produce new instances.

use crate::container::DefinitionKey;
use crate::value::InstancePtr;
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;
use parking_lot::RwLock;

pub type ScopePtr = Box<dyn Scope + Send + Sync>;

pub type ScopeFactoryPtr = Box<dyn ScopeFactory + Send + Sync>;

/// A scope containing instances. See module documentation for information on scopes.
#[cfg_attr(test, automock)]
pub trait Scope {
    /// Gets an instance stored for the given definition, if available in this scope.
    fn instance(&self, key: &DefinitionKey) -> Option<InstancePtr>;

    /// Stores given instance in the scope. The scope might not support storing instances and ignore
    /// it.
    fn store_instance(&self, key: &DefinitionKey, instance: InstancePtr);
}

/// Scope for instances shared between all requests for the same definition.
#[derive(Default)]
pub struct SingletonScope {
    instances: RwLock<FxHashMap<DefinitionKey, InstancePtr>>,
}

impl Scope for SingletonScope {
    #[inline]
    fn instance(&self, key: &DefinitionKey) -> Option<InstancePtr> {
        self.instances.read().get(key).cloned()
    }

    #[inline]
    fn store_instance(&self, key: &DefinitionKey, instance: InstancePtr) {
        self.instances.write().insert(key.clone(), instance);
    }
}

/// A scope which creates a new instance on each request.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct PrototypeScope;

impl Scope for PrototypeScope {
    #[inline]
    fn instance(&self, _key: &DefinitionKey) -> Option<InstancePtr> {
        None
    }

    #[inline]
    fn store_instance(&self, _key: &DefinitionKey, _instance: InstancePtr) {}
}

/// Factory for [Scope]s.
#[cfg_attr(test, automock)]
pub trait ScopeFactory {
    fn create_scope(&self) -> ScopePtr;
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct SingletonScopeFactory;

impl ScopeFactory for SingletonScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<SingletonScope>::default()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct PrototypeScopeFactory;

impl ScopeFactory for PrototypeScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<PrototypeScope>::default()
    }
}
