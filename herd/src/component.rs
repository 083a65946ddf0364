use herd_di::{Injectable, Injected, Instance, Provided, ProviderDef};

use crate::errors::ComponentError;

/// A named declaration registered into the provider registry when its bundle is loaded
///
/// Exactly one of `provider`, `service` and `value` must be set:
/// - `provider`: registered under `name` as is. A factory is instantiated lazily,
///   a [Provided] value is used directly. Its getter produces the service of the same
///   name without the provider suffix.
/// - `service`: a constructor, registered under `name` plus the provider suffix as a
///   provider which can't be injected. The service is built on first request.
/// - `value`: a constant, available as provider and service under `name` right away.
#[derive(Clone, Debug)]
pub struct Component {
    pub name: String,
    pub provider: Option<ProviderDef>,
    pub service: Option<Injected<Option<Instance>>>,
    pub value: Option<Instance>,
}

impl Component {
    /// A component without a definition yet
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: None,
            service: None,
            value: None,
        }
    }

    pub fn provider(name: impl Into<String>, factory: Injected<Provided>) -> Self {
        Self::named(name).with_provider(ProviderDef::factory(factory))
    }

    pub fn service<T: Injectable>(name: impl Into<String>, constructor: Injected<T>) -> Self {
        Self::named(name).with_service(constructor)
    }

    pub fn value<T: Injectable>(name: impl Into<String>, value: T) -> Self {
        Self::named(name).with_value(value)
    }

    pub fn with_provider(mut self, provider: ProviderDef) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_service<T: Injectable>(mut self, constructor: Injected<T>) -> Self {
        self.service = Some(constructor.map(|service| Some(Instance::new(service))));
        self
    }

    pub fn with_value<T: Injectable>(mut self, value: T) -> Self {
        self.value = Some(Instance::new(value));
        self
    }

    /// Validates the declaration and returns the provider name and definition to register
    pub fn definition(&self, provider_suffix: &str) -> Result<(String, ProviderDef), ComponentError> {
        if self.name.trim().is_empty() {
            return Err(ComponentError::InvalidName(self.name.clone()));
        }

        let shapes: Vec<&'static str> = [
            self.provider.as_ref().map(|_| "provider"),
            self.service.as_ref().map(|_| "service"),
            self.value.as_ref().map(|_| "value"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if shapes.len() > 1 {
            return Err(ComponentError::AmbiguousDefinition {
                component: self.name.clone(),
                shapes,
            });
        }

        if let Some(provider) = &self.provider {
            return Ok((self.name.clone(), provider.clone()));
        }

        if let Some(constructor) = &self.service {
            return Ok((
                format!("{}{provider_suffix}", self.name),
                ProviderDef::Service(constructor.clone()),
            ));
        }

        if let Some(value) = &self.value {
            return Ok((
                self.name.clone(),
                ProviderDef::Value(Provided::from_instance(value.clone())),
            ));
        }

        Err(ComponentError::MissingDefinition(self.name.clone()))
    }
}
