//! Dependency resolution engine turning declarative wiring definitions into live object graphs.
//!
//! A [Definition](definition::Definition) describes which class to instantiate, which interfaces
//! it satisfies and which constructor and method calls (with which arguments) to make. All
//! definitions live in a [Container](container::Container), from which the
//! [Injector](injector::Injector) resolves instances on demand. Arguments are resolved by
//! pluggable [ArgumentResolvers](argument::ArgumentResolver), which might in turn request nested
//! instances from the injector.
//!
//! Since there's no runtime reflection, classes are registered by name in a
//! [ClassRegistry](class_registry::ClassRegistry) together with their constructors, and
//! constructed types implement [Wired](value::Wired) to accept method calls by name.
//!
//! ```
//! use springwire_di::class_registry::{ClassMetadata, ClassRegistry};
//! use springwire_di::container::Container;
//! use springwire_di::definition::{Argument, Call, Definition};
//! use springwire_di::error::CallError;
//! use springwire_di::injector::InjectorBuilder;
//! use springwire_di::instance_provider::TypedInstanceProvider;
//! use springwire_di::value::{Value, Wired};
//!
//! struct Logger {
//!     level: Value,
//! }
//!
//! impl Wired for Logger {}
//!
//! fn create_logger(mut arguments: Vec<Value>) -> Result<Box<dyn Wired>, CallError> {
//!     Ok(Box::new(Logger {
//!         level: arguments.pop().unwrap_or(Value::Null),
//!     }))
//! }
//!
//! let mut classes = ClassRegistry::default();
//! classes.register_class("Logger", ClassMetadata::new(create_logger));
//!
//! let mut container = Container::default();
//! container.add_definition(
//!     "LoggerInterface",
//!     Definition::new("Logger", None).unwrap().with_call(
//!         Call::constructor()
//!             .with_argument(Argument::new("level", "scalar").with_property("value", "debug")),
//!     ),
//! );
//!
//! let injector = InjectorBuilder::new(container, classes).build();
//! let logger = injector
//!     .typed_instance::<Logger>("LoggerInterface", None)
//!     .unwrap();
//!
//! assert_eq!(logger.level, Value::from("debug"));
//! ```

pub mod argument;
pub mod class_registry;
pub mod config;
pub mod container;
pub mod definition;
pub mod error;
pub mod injector;
pub mod instance_provider;
pub mod scope;
pub mod value;
