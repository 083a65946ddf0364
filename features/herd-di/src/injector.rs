use std::{
    fmt::Debug,
    sync::{Arc, Weak},
};

use crate::{
    args::FromArg,
    errors::{InjectError, ResolveError},
    injected::Injected,
    instance::InstanceRegistry,
    types::{Injectable, Instance},
};

/// Handle to the service registry
///
/// Always available as a service under the injector name (`$injector` by default),
/// so run callbacks and service getters can resolve services on demand.
/// The handle does not keep the registry alive.
#[derive(Clone)]
pub struct Injector {
    registry: Weak<InstanceRegistry>,
}

impl Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("alive", &(self.registry.strong_count() > 0))
            .finish()
    }
}

impl Injector {
    pub(crate) fn new(registry: Weak<InstanceRegistry>) -> Self {
        Self { registry }
    }

    fn registry(&self) -> Result<Arc<InstanceRegistry>, ResolveError> {
        self.registry.upgrade().ok_or(ResolveError::InjectorDropped)
    }

    /// Resolves a service by name
    pub fn get(&self, name: &str) -> Result<Instance, ResolveError> {
        self.registry()?.get(name)
    }

    /// Resolves a service by name and downcasts it
    pub fn get_as<T: Injectable>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        let instance = self.get(name)?;
        Arc::<T>::from_arg(name, instance)
    }

    /// Invokes `injected` with services as its arguments
    pub fn invoke<T: 'static>(&self, injected: &Injected<T>) -> Result<T, InjectError> {
        self.registry()?.invoke(injected)
    }
}

impl FromArg for Injector {
    fn from_arg(name: &str, instance: Instance) -> Result<Self, ResolveError> {
        Arc::<Injector>::from_arg(name, instance).map(|injector| (*injector).clone())
    }
}
