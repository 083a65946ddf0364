//! Herd DI is the injector core of Herd: two cooperating registries of named values.
//!
//! 1. [ProviderRegistry]: providers, which are constants or lazily instantiated factories.
//!    Providers are injected into other providers and into config callbacks.
//! 2. [InstanceRegistry]: services, which are produced by instantiated providers.
//!    Services are injected into other services and into run callbacks.
//!
//! Callables declare the names of their dependencies, either explicitly or through
//! their parameter list:
//!
//! ```rust
//! use std::sync::Arc;
//! use herd_di::{inject, InstanceRegistry, Provided, ProviderDef, ProviderRegistry};
//!
//! let providers = Arc::new(ProviderRegistry::new());
//! let services = InstanceRegistry::new(providers.clone());
//!
//! let world = Provided::new(()).with_getter_value("world".to_string());
//! providers.register("WorldProvider", ProviderDef::Value(world)).unwrap();
//! providers
//!     .register(
//!         "GreetingProvider",
//!         ProviderDef::factory(inject!(|| Ok(Provided::new(()).with_getter(inject!(|World: Arc<String>| {
//!             Ok(format!("hello {World}"))
//!         }))))),
//!     )
//!     .unwrap();
//! providers.instantiate_all().unwrap();
//!
//! let greeting = services.get("Greeting").unwrap().downcast::<String>().unwrap();
//! assert_eq!(*greeting, "hello world");
//! ```

pub mod annotate;
pub mod args;
pub mod errors;
pub mod injected;
pub mod injector;
pub mod instance;
pub mod provider;
pub mod types;

pub use annotate::annotate;
pub use args::{Args, FromArg};
pub use errors::{InjectError, ReflectError, RegisterError, ResolveError};
pub use injected::{invoke_with, Injected};
pub use injector::Injector;
pub use instance::InstanceRegistry;
pub use provider::{Getter, Provided, ProviderDef, ProviderRegistry, ServiceRecipe};
pub use types::{DynError, Injectable, Instance, TypeInfo};

/// Suffix naming the provider of a service: `Greeting` is produced by `GreetingProvider`
pub const DEFAULT_PROVIDER_SUFFIX: &str = "Provider";

/// Service name under which the [Injector] handle is always available
pub const DEFAULT_INJECTOR_NAME: &str = "$injector";

/// Builds an [Injected] whose dependency names are its parameter names
///
/// Each parameter is converted with [FromArg]. The body must evaluate to
/// `Result<T, DynError>`; `?` works on any error which converts into [DynError].
/// One pair of surrounding underscores is stripped from the names, so
/// `_Greeting_` depends on `Greeting`. Parameters may be declared `mut`.
///
/// ```rust
/// use std::sync::Arc;
/// use herd_di::{inject, Args, Instance};
///
/// let greet = inject!(|Greeting: Arc<String>, _Name_: Arc<String>| Ok(format!("{Greeting} {_Name_}")));
/// assert_eq!(greet.dependencies().unwrap(), ["Greeting", "Name"]);
///
/// let args = Args::new(vec![
///     ("Greeting".to_string(), Instance::new("hello".to_string())),
///     ("Name".to_string(), Instance::new("Bob".to_string())),
/// ]);
/// assert_eq!(greet.call(args).unwrap(), "hello Bob");
/// ```
#[macro_export]
macro_rules! inject {
    (|| $body:expr) => {{
        let call = move |_: $crate::Args| -> ::std::result::Result<_, $crate::DynError> { $body };
        $crate::Injected::from_signature("()", call)
    }};
    (|$($($arg:ident)+ : $ty:ty),* $(,)?| $body:expr) => {{
        #[allow(non_snake_case, unused_mut, unused_variables)]
        let call = move |mut args: $crate::Args| -> ::std::result::Result<_, $crate::DynError> {
            $( $crate::inject!(@bind args; $($arg)+ : $ty); )*
            $body
        };
        $crate::Injected::from_signature(stringify!(($($($arg)+),*)), call)
    }};
    (@bind $args:ident; mut $arg:ident : $ty:ty) => {
        let mut $arg: $ty = $args.take()?;
    };
    (@bind $args:ident; $arg:ident : $ty:ty) => {
        let mut $arg: $ty = $args.take()?;
    };
}
