use std::{ops::Deref, sync::Arc};

use herd_di::{FromArg, Injectable, Instance, ResolveError};

use crate::provider::ConfigProvider;

/// A wrapper type to allow for config injections
///
/// A callback parameter named after the registered [ConfigProvider] receives
/// the config section of type `T`.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use herd_di::{inject, InstanceRegistry, ProviderDef, ProviderRegistry};
/// use herd_config::{config::Config, provider::ConfigProvider};
///
/// struct ServerConfig {
///     port: u16,
/// }
///
/// let mut configs = ConfigProvider::new();
/// configs.add_config(ServerConfig { port: 8080 }).unwrap();
///
/// let providers = Arc::new(ProviderRegistry::new());
/// providers.register(ConfigProvider::DEPENDENCY_NAME, ProviderDef::value(configs)).unwrap();
///
/// let port = providers
///     .invoke(&inject!(|config: Config<ServerConfig>| Ok(config.port)))
///     .unwrap();
/// assert_eq!(port, 8080);
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Injectable> FromArg for Config<T> {
    fn from_arg(name: &str, instance: Instance) -> Result<Self, ResolveError> {
        let config_provider = Arc::<ConfigProvider>::from_arg(name, instance)?;

        let config = config_provider
            .require_config::<T>()
            .map_err(|error| ResolveError::Rejected {
                dependency: name.to_string(),
                error: Arc::new(Box::new(error)),
            })?;

        Ok(Config { inner: config })
    }
}

#[cfg(test)]
mod tests {
    use herd_di::Args;

    use super::*;

    struct Missing;

    #[test]
    fn resolves_the_typed_section() {
        let mut provider = ConfigProvider::new();
        provider.add_config("section".to_string()).unwrap();

        let mut args = Args::new(vec![("config".to_string(), Instance::new(provider))]);
        let config: Config<String> = args.take().unwrap();

        assert_eq!(&*config, "section");
        assert_eq!(*config.into_inner(), "section");
    }

    #[test]
    fn missing_section_is_rejected() {
        let mut args = Args::new(vec![(
            "config".to_string(),
            Instance::new(ConfigProvider::new()),
        )]);

        let error = args.take::<Config<Missing>>().err().unwrap();
        assert!(matches!(error, ResolveError::Rejected { dependency, .. } if dependency == "config"));
    }

    #[test]
    fn wrong_dependency_type_fails_downcast() {
        let mut args = Args::new(vec![("config".to_string(), Instance::new(1_u8))]);

        let error = args.take::<Config<String>>().err().unwrap();
        assert!(matches!(error, ResolveError::DowncastFailed { .. }));
    }
}
