//! Herd assembles an application from bundles.
//!
//! A [Bundle] declares components, the bundles it depends on, and two callbacks.
//! Loading a bundle registers its [Component]s as providers. Booting the [Container]
//! then runs in three steps:
//! 1. Config phase: every config callback, with providers injected by parameter name
//! 2. All providers which were not requested yet are instantiated
//! 3. Run phase: every run callback, with services injected by parameter name
//!
//! Within a phase, a bundle's callback runs after the callbacks of all bundles it
//! depends on, and async callbacks are awaited one after the other.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use herd::{inject, Bundle, Component, Container, Provided};
//!
//! struct CounterState {
//!     start: Mutex<u32>,
//! }
//!
//! let counter = Component::provider(
//!     "CounterProvider",
//!     inject!(|| {
//!         let provider = Arc::new(CounterState { start: Mutex::new(0) });
//!         let getter = provider.clone();
//!         Ok(Provided::from_arc(provider).with_getter(inject!(|| {
//!             Ok(*getter.start.lock().unwrap())
//!         })))
//!     }),
//! );
//!
//! let mut container = Container::new();
//! container
//!     .load_bundle(
//!         Bundle::new("Counter")
//!             .component(counter)
//!             .config(inject!(|CounterProvider: Arc<CounterState>| {
//!                 *CounterProvider.start.lock().unwrap() = 10;
//!                 Ok(())
//!             }))
//!             .run(inject!(|Counter: Arc<u32>| {
//!                 assert_eq!(*Counter, 10);
//!                 Ok(())
//!             })),
//!     )
//!     .unwrap();
//!
//! futures::executor::block_on(container.boot()).unwrap();
//! ```

pub mod bundle;
pub mod component;
pub mod container;
pub mod errors;
pub mod graph;
pub mod options;

pub use bundle::{Bundle, Phase, PhaseCallback, PhaseFuture};
pub use component::Component;
pub use container::Container;
pub use errors::{BootError, ComponentError, GraphError, GraphErrors, LoadError};
pub use graph::BundleGraph;
pub use options::ContainerOptions;

pub use herd_di::{
    inject, DynError, FromArg, InjectError, Injectable, Injected, Injector, InstanceRegistry,
    Provided, ProviderDef, ProviderRegistry, ResolveError,
};
