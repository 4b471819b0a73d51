//! Runtime values flowing through resolution: resolved arguments, call results and the wired
//! instances themselves.
//!
//! Every type which can be constructed from a [Definition](crate::definition::Definition)
//! implements [Wired]. Since there's no runtime reflection, method calls declared in definitions
//! are dispatched by name through [Wired::call] (setters applied during construction) and
//! [Wired::query] (argument-less methods used by the `call` argument kind).

use crate::error::{CallError, ResolutionError};
use derivative::Derivative;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Shared pointer to a fully constructed instance.
pub type InstancePtr = Arc<dyn Wired>;

/// Helper trait for type-erased access to [Wired] instances. Implemented automatically.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Base trait for types constructed by the [Injector](crate::injector::Injector).
pub trait Wired: AsAny {
    /// Invokes a method declared as a call in a definition. Called in declaration order, after
    /// construction and before the instance is shared.
    fn call(&mut self, method: &str, _arguments: Vec<Value>) -> Result<(), CallError> {
        Err(CallError::UnknownMethod(method.to_string()))
    }

    /// Invokes an argument-less method and returns its result.
    fn query(&self, method: &str) -> Result<Value, CallError> {
        Err(CallError::UnknownMethod(method.to_string()))
    }
}

impl Debug for dyn Wired {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Wired")
            .field(&<dyn Wired as AsAny>::type_name(self))
            .finish()
    }
}

/// Value of a resolved argument.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(BTreeMap<String, String>),
    Instance(#[derivative(Debug = "ignore")] InstancePtr),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Value::Map(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&InstancePtr> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns the contained instance downcast to `T`.
    pub fn instance_of<T: Wired>(&self) -> Result<Arc<T>, ResolutionError> {
        match self {
            Value::Instance(instance) => downcast_instance(instance.clone(), "<argument>"),
            _ => Err(ResolutionError::NotAnInstance),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<InstancePtr> for Value {
    fn from(value: InstancePtr) -> Self {
        Value::Instance(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

pub(crate) fn downcast_instance<T: Wired>(
    instance: InstancePtr,
    class: &str,
) -> Result<Arc<T>, ResolutionError> {
    instance
        .into_any()
        .downcast::<T>()
        .map_err(|_| ResolutionError::IncompatibleInstance {
            class: class.to_string(),
            expected: type_name::<T>().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::error::{CallError, ResolutionError};
    use crate::value::{InstancePtr, Value, Wired};
    use std::any::type_name;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Greeter;

    impl Wired for Greeter {
        fn query(&self, method: &str) -> Result<Value, CallError> {
            match method {
                "greeting" => Ok("hello".into()),
                _ => Err(CallError::UnknownMethod(method.to_string())),
            }
        }
    }

    #[derive(Debug)]
    struct Other;

    impl Wired for Other {}

    #[test]
    fn should_downcast_instance() {
        let value = Value::Instance(Arc::new(Greeter) as InstancePtr);
        let greeter = value.instance_of::<Greeter>().unwrap();

        assert_eq!(greeter.query("greeting").unwrap(), Value::from("hello"));
    }

    #[test]
    fn should_reject_incompatible_instance() {
        let value = Value::Instance(Arc::new(Other) as InstancePtr);

        assert!(matches!(
            value.instance_of::<Greeter>().unwrap_err(),
            ResolutionError::IncompatibleInstance { .. }
        ));
        assert!(matches!(
            Value::Null.instance_of::<Greeter>().unwrap_err(),
            ResolutionError::NotAnInstance
        ));
    }

    #[test]
    fn should_reject_unknown_methods_by_default() {
        let mut other = Other;

        assert!(matches!(
            other.call("setName", vec![]).unwrap_err(),
            CallError::UnknownMethod(method) if method == "setName"
        ));
        assert!(other.query("name").is_err());
    }

    #[test]
    fn should_compare_instances_by_identity() {
        let instance = Arc::new(Other) as InstancePtr;

        assert_eq!(
            Value::Instance(instance.clone()),
            Value::Instance(instance)
        );
        assert_ne!(
            Value::Instance(Arc::new(Other) as InstancePtr),
            Value::Instance(Arc::new(Other) as InstancePtr)
        );
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn should_debug_format_instances_with_type_name() {
        let instance = Arc::new(Other) as InstancePtr;

        assert_eq!(
            format!("{instance:?}"),
            format!("Wired({:?})", type_name::<Other>())
        );
    }
}
