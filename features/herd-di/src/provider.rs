use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    args::Args,
    errors::{InjectError, RegisterError, ResolveError},
    injected::{invoke_with, Injected},
    types::{Injectable, Instance, Slot},
};

/// Produces the service instance of a provider
#[derive(Clone, Debug)]
pub enum Getter {
    /// The service is this value
    Value(Instance),
    /// The service is built by calling this, with services injected
    Factory(Injected<Option<Instance>>),
}

/// A resolved provider
///
/// `instance` is what gets injected into other providers and config callbacks.
/// The optional getter produces the service of the same name (minus the provider suffix).
#[derive(Clone, Debug)]
pub struct Provided {
    instance: Instance,
    getter: Option<Getter>,
    injectable: bool,
}

impl Provided {
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_instance(Instance::new(value))
    }

    /// Shares `value`, so the getter can hold on to it too
    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Self::from_instance(Instance::from_arc(value))
    }

    pub fn from_instance(instance: Instance) -> Self {
        Self {
            instance,
            getter: None,
            injectable: true,
        }
    }

    /// The service will be built by `getter`
    pub fn with_getter<T: Injectable>(self, getter: Injected<T>) -> Self {
        self.with(Getter::Factory(getter.map(|value| Some(Instance::new(value)))))
    }

    /// The service will be built by `getter`, producing `None` is an error
    pub fn with_optional_getter<T: Injectable>(self, getter: Injected<Option<T>>) -> Self {
        self.with(Getter::Factory(getter.map(|value| value.map(Instance::new))))
    }

    /// The service will be `value`
    pub fn with_getter_value<T: Injectable>(self, value: T) -> Self {
        self.with(Getter::Value(Instance::new(value)))
    }

    pub fn with(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Hides the provider from injection, it can still produce its service
    pub fn non_injectable(mut self) -> Self {
        self.injectable = false;
        self
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    pub fn is_injectable(&self) -> bool {
        self.injectable
    }

    fn service(name: &str, constructor: Injected<Option<Instance>>) -> Self {
        Self::new(ServiceRecipe {
            provider: name.to_string(),
        })
        .with(Getter::Factory(constructor))
        .non_injectable()
    }
}

/// Provider object backing a service registered from a constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecipe {
    pub provider: String,
}

/// Definition of a provider
#[derive(Clone, Debug)]
pub enum ProviderDef {
    /// Already instantiated
    Value(Provided),
    /// Instantiated on first request, may produce `None`, which is an error
    Factory(Injected<Option<Provided>>),
    /// Service constructor, becomes a non-injectable provider whose getter is the constructor
    Service(Injected<Option<Instance>>),
}

impl ProviderDef {
    /// A constant, callables passed here are stored as is and never invoked
    pub fn value<T: Injectable>(value: T) -> Self {
        Self::Value(Provided::new(value))
    }

    pub fn factory(factory: Injected<Provided>) -> Self {
        Self::Factory(factory.map(Some))
    }

    pub fn service<T: Injectable>(constructor: Injected<T>) -> Self {
        Self::Service(constructor.map(|value| Some(Instance::new(value))))
    }

    /// The provider, if it does not need to be instantiated
    fn eager(&self, name: &str) -> Option<Provided> {
        match self {
            ProviderDef::Value(provided) => Some(provided.clone()),
            ProviderDef::Service(constructor) => Some(Provided::service(name, constructor.clone())),
            ProviderDef::Factory(_) => None,
        }
    }
}

struct ProviderEntry {
    definition: ProviderDef,
    slot: Slot<Provided>,
}

/// Registry of named providers
///
/// Factories are instantiated lazily, the first time they are requested,
/// and at most once.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Mutex<HashMap<String, ProviderEntry>>,
}

impl Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries();
        let mut map = f.debug_map();
        for (name, entry) in entries.iter() {
            let state = match &entry.slot {
                Slot::Unresolved => "unresolved",
                Slot::InProgress => "in progress",
                Slot::Resolved(_) => "resolved",
            };
            map.entry(name, &state);
        }
        map.finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // The lock is never held while user code runs, so poisoning leaves consistent data
    fn entries(&self) -> MutexGuard<'_, HashMap<String, ProviderEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers or replaces a provider
    pub fn register(
        &self,
        name: impl Into<String>,
        definition: ProviderDef,
    ) -> Result<(), RegisterError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegisterError::InvalidName(name));
        }

        let slot = definition
            .eager(&name)
            .map_or(Slot::Unresolved, Slot::Resolved);
        tracing::debug!(
            "Registering provider '{name}' ({})",
            if matches!(slot, Slot::Unresolved) { "lazy" } else { "instantiated" }
        );

        let entry = ProviderEntry { definition, slot };
        if self.entries().insert(name.clone(), entry).is_some() {
            tracing::debug!("Provider '{name}' replaced an existing definition");
        }

        Ok(())
    }

    /// True if a provider is registered under `name`, instantiated or not
    pub fn contains(&self, name: &str) -> bool {
        self.entries().contains_key(name)
    }

    /// True if the provider exists and has been instantiated
    pub fn has(&self, name: &str) -> bool {
        matches!(
            self.entries().get(name).map(|entry| &entry.slot),
            Some(Slot::Resolved(_))
        )
    }

    /// All registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the provider, instantiating it if needed
    pub fn get(&self, name: &str) -> Result<Provided, ResolveError> {
        let factory = {
            let mut entries = self.entries();
            let entry = entries
                .get_mut(name)
                .ok_or_else(|| ResolveError::UnknownProvider(name.to_string()))?;

            match &entry.slot {
                Slot::Resolved(provided) => return Ok(provided.clone()),
                Slot::InProgress => return Err(ResolveError::CircularProvider(name.to_string())),
                Slot::Unresolved => {}
            }

            let factory = match &entry.definition {
                ProviderDef::Factory(factory) => factory.clone(),
                eager => {
                    let provided = eager.eager(name).ok_or_else(|| {
                        ResolveError::UnknownProvider(name.to_string())
                    })?;
                    entry.slot = Slot::Resolved(provided.clone());
                    return Ok(provided);
                }
            };

            // Stays in progress if instantiation fails
            entry.slot = Slot::InProgress;
            factory
        };

        tracing::debug!("Instantiating provider '{name}'");
        let args = Args::resolve(factory.dependencies()?, |dependency| {
            self.get_injectable(dependency)
                .map(|provided| provided.instance)
        })?;

        let provided = factory
            .call(args)
            .map_err(|error| ResolveError::FactoryFailed {
                provider: name.to_string(),
                error: Arc::new(error),
            })?
            .ok_or_else(|| ResolveError::NullProvider(name.to_string()))?;

        if let Some(entry) = self.entries().get_mut(name) {
            entry.slot = Slot::Resolved(provided.clone());
        }
        tracing::debug!("Instantiated provider '{name}' as {}", provided.instance.info);

        Ok(provided)
    }

    /// Returns the provider, failing if it is hidden from injection
    fn get_injectable(&self, name: &str) -> Result<Provided, ResolveError> {
        let provided = self.get(name)?;
        if !provided.is_injectable() {
            return Err(ResolveError::NotInjectable(name.to_string()));
        }

        Ok(provided)
    }

    /// Instantiates every provider which has not been requested yet
    pub fn instantiate_all(&self) -> Result<(), ResolveError> {
        let names = self.names();
        tracing::debug!("Instantiating all {} providers", names.len());

        for name in names {
            let pending = match self.entries().get(&name).map(|entry| &entry.slot) {
                Some(Slot::InProgress) => {
                    return Err(ResolveError::IncompleteInstantiation(name));
                }
                Some(Slot::Unresolved) => true,
                _ => false,
            };

            if pending {
                self.get(&name)?;
            }
        }

        Ok(())
    }

    /// Invokes `injected` with providers as its arguments
    pub fn invoke<T: 'static>(&self, injected: &Injected<T>) -> Result<T, InjectError> {
        invoke_with(injected, |dependency| {
            self.get_injectable(dependency)
                .map(|provided| provided.instance)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting_factory(dependency: &'static str) -> ProviderDef {
        ProviderDef::factory(Injected::new([dependency], |mut args| {
            let world: Arc<String> = args.take()?;
            Ok(Provided::new(format!("hello {world}")))
        }))
    }

    fn world_factory() -> ProviderDef {
        ProviderDef::factory(Injected::new(Vec::<String>::new(), |_| {
            Ok(Provided::new("world".to_string()))
        }))
    }

    #[test]
    fn register_validates_name() {
        let registry = ProviderRegistry::new();
        assert_eq!(
            registry.register(" \t", ProviderDef::value(1)),
            Err(RegisterError::InvalidName(" \t".to_string()))
        );
        assert!(!registry.contains(" \t"));
    }

    #[test]
    fn values_are_instantiated_on_registration() {
        let registry = ProviderRegistry::new();
        assert!(!registry.has("Pi"));

        registry.register("Pi", ProviderDef::value(2.5_f64)).unwrap();

        assert!(registry.has("Pi"));
        let provided = registry.get("Pi").unwrap();
        assert_eq!(*provided.instance().downcast::<f64>().unwrap(), 2.5);
    }

    #[test]
    fn callables_registered_as_values_are_not_invoked() {
        let registry = ProviderRegistry::new();
        let callable: fn() -> &'static str = || "hello!";

        registry.register("Func", ProviderDef::value(callable)).unwrap();

        assert!(registry.has("Func"));
        let stored = registry
            .get("Func")
            .unwrap()
            .instance()
            .downcast::<fn() -> &'static str>()
            .unwrap();
        assert_eq!(stored(), "hello!");
    }

    #[test]
    fn factories_are_lazy_and_memoized() {
        let registry = ProviderRegistry::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        registry
            .register(
                "Counter",
                ProviderDef::factory(Injected::new(Vec::<String>::new(), move |_| {
                    *counter.lock().unwrap() += 1;
                    Ok(Provided::new(7_u8))
                })),
            )
            .unwrap();

        assert!(registry.contains("Counter"));
        assert!(!registry.has("Counter"));

        let first = registry.get("Counter").unwrap();
        let second = registry.get("Counter").unwrap();

        assert!(registry.has("Counter"));
        assert!(first.instance().same_as(second.instance()));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn dependencies_are_injected() {
        let registry = ProviderRegistry::new();
        registry.register("GreetingProvider", greeting_factory("WorldProvider")).unwrap();
        registry.register("WorldProvider", world_factory()).unwrap();

        let greeting = registry.get("GreetingProvider").unwrap();

        assert_eq!(*greeting.instance().downcast::<String>().unwrap(), "hello world");
        assert!(registry.has("GreetingProvider"));
        assert!(registry.has("WorldProvider"));
    }

    #[test]
    fn circular_dependencies_fail_and_stay_unresolved() {
        let registry = ProviderRegistry::new();
        registry.register("GreetingProvider", greeting_factory("WorldProvider")).unwrap();
        registry.register("WorldProvider", greeting_factory("GreetingProvider")).unwrap();

        let error = registry.get("GreetingProvider").unwrap_err();

        assert!(matches!(error, ResolveError::CircularProvider(name) if name == "GreetingProvider"));
        assert!(!registry.has("GreetingProvider"));
        assert!(!registry.has("WorldProvider"));
    }

    #[test]
    fn unknown_dependencies_fail() {
        let registry = ProviderRegistry::new();
        registry.register("GreetingProvider", greeting_factory("WorldProvider")).unwrap();
        registry.register("WorldProvider", greeting_factory("AnotherProvider")).unwrap();

        let error = registry.get("GreetingProvider").unwrap_err();
        assert!(matches!(error, ResolveError::UnknownProvider(name) if name == "AnotherProvider"));
    }

    #[test]
    fn non_injectable_dependencies_are_rejected() {
        let registry = ProviderRegistry::new();
        registry.register("GreetingProvider", greeting_factory("WorldProvider")).unwrap();
        registry
            .register(
                "WorldProvider",
                ProviderDef::factory(Injected::new(Vec::<String>::new(), |_| {
                    Ok(Provided::new(()).with_getter_value("world".to_string()).non_injectable())
                })),
            )
            .unwrap();

        let error = registry.get("GreetingProvider").unwrap_err();
        assert!(matches!(error, ResolveError::NotInjectable(name) if name == "WorldProvider"));
        // Getting it directly is still fine
        assert!(registry.get("WorldProvider").is_ok());
    }

    #[test]
    fn factory_producing_nothing_fails() {
        let registry = ProviderRegistry::new();
        registry
            .register(
                "Nothing",
                ProviderDef::Factory(Injected::new(Vec::<String>::new(), |_| Ok(None))),
            )
            .unwrap();

        assert!(matches!(registry.get("Nothing"), Err(ResolveError::NullProvider(_))));
    }

    #[test]
    fn factory_errors_name_the_provider() {
        let registry = ProviderRegistry::new();
        registry
            .register(
                "Broken",
                ProviderDef::Factory(Injected::new(Vec::<String>::new(), |_| Err("no disk".into()))),
            )
            .unwrap();

        let error = registry.get("Broken").unwrap_err();
        assert_eq!(error.to_string(), "Factory for provider 'Broken' failed - error: no disk");
    }

    #[test]
    fn instantiate_all_resolves_pending_providers() {
        let registry = ProviderRegistry::new();
        registry.register("GreetingProvider", greeting_factory("WorldProvider")).unwrap();
        registry.register("WorldProvider", world_factory()).unwrap();

        registry.instantiate_all().unwrap();

        assert!(registry.has("GreetingProvider"));
        assert!(registry.has("WorldProvider"));
    }

    #[test]
    fn instantiate_all_reports_leftover_failures() {
        let registry = ProviderRegistry::new();
        registry.register("GreetingProvider", greeting_factory("WorldProvider")).unwrap();
        registry.register("WorldProvider", greeting_factory("GreetingProvider")).unwrap();
        assert!(registry.get("GreetingProvider").is_err());

        let error = registry.instantiate_all().unwrap_err();
        assert!(matches!(error, ResolveError::IncompleteInstantiation(_)));
    }

    #[test]
    fn reregistering_replaces_the_entry() {
        let registry = ProviderRegistry::new();
        registry.register("Name", ProviderDef::value("Alice".to_string())).unwrap();
        registry.register("Name", world_factory()).unwrap();

        assert!(!registry.has("Name"));
        let provided = registry.get("Name").unwrap();
        assert_eq!(*provided.instance().downcast::<String>().unwrap(), "world");
    }

    #[test]
    fn invoke_injects_providers() {
        let registry = ProviderRegistry::new();
        registry.register("WorldProvider", world_factory()).unwrap();

        let result = registry
            .invoke(&Injected::new(["WorldProvider"], |mut args| {
                let world: Arc<String> = args.take()?;
                Ok(world.len())
            }))
            .unwrap();

        assert_eq!(result, 5);
    }

    #[test]
    fn services_register_as_hidden_providers() {
        let registry = ProviderRegistry::new();
        registry
            .register(
                "MyServiceProvider",
                ProviderDef::service(Injected::new(Vec::<String>::new(), |_| Ok(1_u8))),
            )
            .unwrap();

        let provided = registry.get("MyServiceProvider").unwrap();
        assert!(!provided.is_injectable());
        assert!(matches!(provided.getter(), Some(Getter::Factory(_))));
        assert_eq!(
            *provided.instance().downcast::<ServiceRecipe>().unwrap(),
            ServiceRecipe {
                provider: "MyServiceProvider".to_string()
            }
        );
    }
}
