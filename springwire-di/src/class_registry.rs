//! Functionality related to registering constructible classes. Definitions refer to classes by
//! name, so every class used in a definition needs to be registered along with its constructor
//! and parameter declarations. Classes and free functions can be registered manually or
//! statically with [inventory]:
//!
//! ```
//! use springwire_di::class_registry::internal::{submit, ClassRegisterer};
//! use springwire_di::class_registry::{ClassMetadata, ClassRegistry};
//! use springwire_di::value::Wired;
//!
//! struct Logger;
//!
//! impl Wired for Logger {}
//!
//! submit! {
//!     ClassRegisterer {
//!         name: "Logger",
//!         register: || ClassMetadata::new(|_| Ok(Box::new(Logger))),
//!     }
//! }
//!
//! let registry = ClassRegistry::from_static();
//! assert!(registry.class("Logger").is_some());
//! ```

use crate::error::{CallError, ResolutionError};
use crate::value::{Value, Wired};
use derivative::Derivative;
use fxhash::FxHashMap;
use tracing::debug;

/// Creates a new instance from resolved constructor arguments.
pub type Constructor = fn(arguments: Vec<Value>) -> Result<Box<dyn Wired>, CallError>;

/// Free function or static method callable by `call` arguments.
pub type Function = fn() -> Result<Value, CallError>;

/// Declared parameter of a constructor or method.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Parameter {
    pub name: String,
    /// Native type of the parameter. If no argument is bound to the parameter, an instance of
    /// this interface is requested instead.
    pub interface: Option<String>,
    /// Unbound optional parameters receive [Value::Null].
    pub optional: bool,
}

impl Parameter {
    pub fn new<T: ToString>(name: T) -> Self {
        Self {
            name: name.to_string(),
            interface: None,
            optional: false,
        }
    }

    pub fn typed<T: ToString, I: ToString>(name: T, interface: I) -> Self {
        Self {
            name: name.to_string(),
            interface: Some(interface.to_string()),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Registration information for a class.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ClassMetadata {
    /// Constructor parameters. An empty list means arguments are passed positionally, in
    /// declaration order.
    pub parameters: Vec<Parameter>,

    #[derivative(Debug = "ignore")]
    pub constructor: Constructor,

    /// Parameter declarations of methods, following the same rules as constructor parameters.
    pub methods: FxHashMap<String, Vec<Parameter>>,

    #[derivative(Debug = "ignore")]
    pub static_methods: FxHashMap<String, Function>,
}

impl ClassMetadata {
    pub fn new(constructor: Constructor) -> Self {
        Self {
            parameters: vec![],
            constructor,
            methods: Default::default(),
            static_methods: Default::default(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_method<T: ToString>(mut self, method: T, parameters: Vec<Parameter>) -> Self {
        self.methods.insert(method.to_string(), parameters);
        self
    }

    pub fn with_static_method<T: ToString>(mut self, method: T, function: Function) -> Self {
        self.static_methods.insert(method.to_string(), function);
        self
    }

    /// Returns declared parameters of given method, or an empty list when undeclared.
    pub fn method_parameters(&self, method: &str) -> &[Parameter] {
        self.methods
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Registry of all classes and functions available to definitions.
#[derive(Clone, Default, Debug)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassMetadata>,
    functions: FxHashMap<String, Function>,
}

impl ClassRegistry {
    /// Creates a registry initialized from statically submitted classes and functions.
    pub fn from_static() -> Self {
        let mut registry = Self::default();

        for registerer in inventory::iter::<internal::ClassRegisterer> {
            registry.register_class(registerer.name, (registerer.register)());
        }

        for registerer in inventory::iter::<internal::FunctionRegisterer> {
            registry.register_function(registerer.name, registerer.function);
        }

        registry
    }

    /// Registers a class. Registering the same name again overrides the previous registration.
    pub fn register_class<T: ToString>(&mut self, name: T, metadata: ClassMetadata) {
        let name = name.to_string();
        if self.classes.contains_key(&name) {
            debug!(class = %name, "Overriding class registration");
        }

        self.classes.insert(name, metadata);
    }

    pub fn register_function<T: ToString>(&mut self, name: T, function: Function) {
        self.functions.insert(name.to_string(), function);
    }

    /// Adds a static method to an already registered class.
    pub fn register_static_method<M: ToString>(
        &mut self,
        class: &str,
        method: M,
        function: Function,
    ) -> Result<(), ResolutionError> {
        self.classes
            .get_mut(class)
            .ok_or_else(|| ResolutionError::UnknownClass(class.to_string()))?
            .static_methods
            .insert(method.to_string(), function);
        Ok(())
    }

    #[inline]
    pub fn class(&self, name: &str) -> Option<&ClassMetadata> {
        self.classes.get(name)
    }

    #[inline]
    pub fn is_registered(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn function(&self, name: &str) -> Result<Function, ResolutionError> {
        self.functions
            .get(name)
            .copied()
            .ok_or_else(|| ResolutionError::UnknownFunction(name.to_string()))
    }

    pub fn static_method(&self, class: &str, method: &str) -> Result<Function, ResolutionError> {
        self.class(class)
            .ok_or_else(|| ResolutionError::UnknownClass(class.to_string()))?
            .static_methods
            .get(method)
            .copied()
            .ok_or_else(|| ResolutionError::UnknownStaticMethod {
                class: class.to_string(),
                method: method.to_string(),
            })
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::class_registry::{ClassMetadata, Function};
    use inventory::collect;
    pub use inventory::submit;

    pub struct ClassRegisterer {
        pub name: &'static str,
        pub register: fn() -> ClassMetadata,
    }

    pub struct FunctionRegisterer {
        pub name: &'static str,
        pub function: Function,
    }

    collect!(ClassRegisterer);
    collect!(FunctionRegisterer);
}
