use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    args::Args,
    errors::{InjectError, ResolveError},
    injected::{invoke_with, Injected},
    injector::Injector,
    provider::{Getter, Provided, ProviderRegistry},
    types::{Instance, Slot},
    DEFAULT_INJECTOR_NAME, DEFAULT_PROVIDER_SUFFIX,
};

/// Registry of services, built from instantiated providers
///
/// A service `Name` is produced by the provider `NameProvider` if it is instantiated,
/// otherwise by an injectable provider called `Name`. Services are memoized.
pub struct InstanceRegistry {
    providers: Arc<ProviderRegistry>,
    provider_suffix: String,
    slots: Mutex<HashMap<String, Slot<Instance>>>,
}

impl Debug for InstanceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.slots().keys().cloned().collect();
        names.sort();
        f.debug_struct("InstanceRegistry")
            .field("provider_suffix", &self.provider_suffix)
            .field("services", &names)
            .finish()
    }
}

impl InstanceRegistry {
    pub fn new(providers: Arc<ProviderRegistry>) -> Arc<Self> {
        Self::with_names(providers, DEFAULT_PROVIDER_SUFFIX, DEFAULT_INJECTOR_NAME)
    }

    /// Creates the registry with a custom provider suffix and injector service name
    pub fn with_names(
        providers: Arc<ProviderRegistry>,
        provider_suffix: impl Into<String>,
        injector_name: impl Into<String>,
    ) -> Arc<Self> {
        let injector_name = injector_name.into();
        Arc::new_cyclic(|registry| {
            let injector = Instance::new(Injector::new(registry.clone()));
            let slots = HashMap::from([(injector_name, Slot::Resolved(injector))]);

            Self {
                providers,
                provider_suffix: provider_suffix.into(),
                slots: Mutex::new(slots),
            }
        })
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot<Instance>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn provider_suffix(&self) -> &str {
        &self.provider_suffix
    }

    /// Handle to this registry, as injected under the injector name
    pub fn injector(self: &Arc<Self>) -> Injector {
        Injector::new(Arc::downgrade(self))
    }

    /// True if the service has already been resolved
    pub fn has(&self, name: &str) -> bool {
        matches!(self.slots().get(name), Some(Slot::Resolved(_)))
    }

    /// Returns the service, building it from its provider on first request
    pub fn get(&self, name: &str) -> Result<Instance, ResolveError> {
        match self.slots().get(name) {
            Some(Slot::Resolved(instance)) => return Ok(instance.clone()),
            Some(Slot::InProgress) => {
                return Err(ResolveError::CircularService(name.to_string()));
            }
            Some(Slot::Unresolved) | None => {}
        }

        let provider = self.find_provider(name)?;
        let instance = match provider.getter() {
            // Constants are their own service
            None => provider.instance().clone(),
            Some(Getter::Value(value)) => value.clone(),
            Some(Getter::Factory(accessor)) => {
                self.slots().insert(name.to_string(), Slot::InProgress);
                tracing::debug!("Instantiating service '{name}'");

                // A failed service stays in progress, later requests fail as circular
                self.call_accessor(name, accessor)?
            }
        };

        self.slots()
            .insert(name.to_string(), Slot::Resolved(instance.clone()));
        Ok(instance)
    }

    /// Finds the provider for a service, preferring the suffixed name
    fn find_provider(&self, name: &str) -> Result<Provided, ResolveError> {
        let suffixed = format!("{name}{}", self.provider_suffix);
        if self.providers.has(&suffixed) {
            return self.providers.get(&suffixed);
        }

        if self.providers.has(name) {
            let provided = self.providers.get(name)?;
            if provided.is_injectable() {
                return Ok(provided);
            }
            // Hidden providers are invisible as services too
            tracing::trace!("Ignoring non-injectable provider '{name}' for service lookup");
        }

        Err(ResolveError::NoSuitableProvider(name.to_string()))
    }

    fn call_accessor(
        &self,
        name: &str,
        accessor: &Injected<Option<Instance>>,
    ) -> Result<Instance, ResolveError> {
        let args = Args::resolve(accessor.dependencies()?, |dependency| self.get(dependency))?;

        accessor
            .call(args)
            .map_err(|error| ResolveError::AccessorFailed {
                service: name.to_string(),
                error: Arc::new(error),
            })?
            .ok_or_else(|| ResolveError::NullService(name.to_string()))
    }

    /// Invokes `injected` with services as its arguments
    pub fn invoke<T: 'static>(&self, injected: &Injected<T>) -> Result<T, InjectError> {
        invoke_with(injected, |dependency| self.get(dependency))
    }
}
