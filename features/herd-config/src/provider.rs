use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
};

use herd_di::{Injectable, TypeInfo};

use crate::errors::ConfigError;

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type. The provider itself is
/// registered into the container as an external dependency, usually under
/// [ConfigProvider::DEPENDENCY_NAME].
#[derive(Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, (TypeInfo, Arc<dyn Any + Send + Sync + 'static>)>,
}

impl Debug for ConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.configs.values().map(|(info, _)| info.type_name))
            .finish()
    }
}

impl ConfigProvider {
    /// Conventional name of the provider in the container
    pub const DEPENDENCY_NAME: &'static str = "config";

    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type.
    ///
    /// Returns `Ok(None)` if no config of this type was registered
    pub fn get_config<T: Injectable>(&self) -> Result<Option<Arc<T>>, ConfigError> {
        self.configs
            .get(&TypeId::of::<T>())
            .map(|(_, entry)| entry.clone().downcast())
            .transpose()
            .map_err(|_| ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Retrieve a config with specified type, failing if it is not registered
    pub fn require_config<T: Injectable>(&self) -> Result<Arc<T>, ConfigError> {
        self.get_config()?
            .ok_or_else(|| ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return a
    /// [`ConfigError::AlreadyRegistered`]
    pub fn add_config<T: Injectable>(&mut self, config: T) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();

        if self.configs.contains_key(&info.type_id) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        tracing::debug!("Registered config '{info}'");
        self.configs.insert(info.type_id, (info, Arc::new(config)));
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Injectable>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
