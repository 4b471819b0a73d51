use springwire_di::class_registry::{ClassMetadata, ClassRegistry, Parameter};
use springwire_di::container::Container;
use springwire_di::definition::{Argument, Call, Definition};
use springwire_di::error::CallError;
use springwire_di::injector::InjectorBuilder;
use springwire_di::instance_provider::TypedInstanceProvider;
use springwire_di::value::{Value, Wired};
use std::sync::Arc;

// a class we would like to construct from a definition
struct Greeter {
    greeting: String,
}

// setters and argument-less methods are called by name
impl Wired for Greeter {
    fn call(&mut self, method: &str, arguments: Vec<Value>) -> Result<(), CallError> {
        match (method, arguments.first().and_then(Value::as_str)) {
            ("setGreeting", Some(greeting)) => {
                self.greeting = greeting.to_string();
                Ok(())
            }
            _ => Err(CallError::UnknownMethod(method.to_string())),
        }
    }
}

// another class, depending on the first one
struct Application {
    greeter: Arc<Greeter>,
}

impl Wired for Application {}

impl Application {
    fn greet(&self) {
        println!("{}", self.greeter.greeting);
    }
}

//noinspection DuplicatedCode
// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // every class used in definitions needs to be registered with a constructor
    let mut classes = ClassRegistry::default();
    classes.register_class(
        "Greeter",
        ClassMetadata::new(|_| {
            Ok(Box::new(Greeter {
                greeting: "Hello!".to_string(),
            }))
        }),
    );

    // the "greeter" parameter is not declared in the definition below, so the injector will
    // request an instance of "GreeterInterface" on its own
    classes.register_class(
        "Application",
        ClassMetadata::new(|arguments| {
            let greeter = arguments[0]
                .instance_of::<Greeter>()
                .map_err(|error| CallError::InvalidArguments {
                    method: "__construct".to_string(),
                    message: error.to_string(),
                })?;

            Ok(Box::new(Application { greeter }))
        })
        .with_parameter(Parameter::typed("greeter", "GreeterInterface")),
    );

    // definitions are usually read from files, but can also be created by hand
    let mut container = Container::default();
    container.add_definition(
        "GreeterInterface",
        Definition::new("Greeter", None).unwrap().with_call(
            Call::new("setGreeting").with_argument(
                Argument::new("greeting", "scalar").with_property("value", "Hello world!"),
            ),
        ),
    );
    container.register(Definition::new("Application", None).unwrap());

    let injector = InjectorBuilder::new(container, classes).build();

    let application = injector
        .typed_instance::<Application>("Application", None)
        .expect("error creating Application");

    // prints "Hello world!"
    application.greet();
}
