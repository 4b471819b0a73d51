use crate::container::DefinitionKey;
use crate::error::ResolutionError;
use crate::value::{downcast_instance, InstancePtr, Wired};
use fxhash::FxHashSet;
use std::sync::Arc;

/// Set of (interface, identifier) pairs currently being resolved. Candidates in this set are
/// skipped when selecting a definition, which prevents injecting an instance into itself.
pub type Exclusions = FxHashSet<DefinitionKey>;

/// Generic provider for instances, used by argument resolvers to resolve nested dependencies.
pub trait InstanceProvider {
    /// Resolves an instance for given interface. Without an identifier, the default definition is
    /// selected, unless excluded.
    fn instance(
        &self,
        interface: &str,
        identifier: Option<&str>,
        exclude: &Exclusions,
    ) -> Result<InstancePtr, ResolutionError>;
}

/// Helper trait for [InstanceProvider] providing strongly-typed access.
pub trait TypedInstanceProvider {
    /// Typesafe version of [InstanceProvider::instance], failing when the instance is not a `T`.
    fn typed_instance<T: Wired>(
        &self,
        interface: &str,
        identifier: Option<&str>,
    ) -> Result<Arc<T>, ResolutionError>;
}

impl<P: InstanceProvider + ?Sized> TypedInstanceProvider for P {
    fn typed_instance<T: Wired>(
        &self,
        interface: &str,
        identifier: Option<&str>,
    ) -> Result<Arc<T>, ResolutionError> {
        let instance = self.instance(interface, identifier, &Exclusions::default())?;
        downcast_instance(instance, interface)
    }
}
