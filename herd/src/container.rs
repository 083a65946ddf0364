use std::sync::Arc;

use herd_di::{
    Injectable, Injector, InstanceRegistry, Provided, ProviderDef, ProviderRegistry, RegisterError,
};

use crate::{
    bundle::{Bundle, Phase},
    errors::{BootError, ComponentError, GraphError, GraphErrors, LoadError},
    graph::BundleGraph,
    options::ContainerOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BootState {
    NotBooted,
    Booted,
}

/// Owns the bundles and both registries, and boots the application
///
/// Booting runs the config callbacks of all bundles in dependency order,
/// instantiates the remaining providers, then runs the run callbacks in the same order.
///
/// ```rust
/// use std::sync::Arc;
/// use herd::{inject, Bundle, Component, Container};
///
/// let mut container = Container::new();
/// container
///     .load_bundle(Bundle::new("Greeter")
///         .component(Component::value("Greeting", "hello".to_string()))
///         .run(inject!(|Greeting: Arc<String>| {
///             assert_eq!(*Greeting, "hello");
///             Ok(())
///         })))
///     .unwrap();
///
/// futures::executor::block_on(container.boot()).unwrap();
/// assert!(container.is_booted());
/// ```
pub struct Container {
    options: ContainerOptions,
    providers: Arc<ProviderRegistry>,
    services: Arc<InstanceRegistry>,
    graph: BundleGraph,
    state: BootState,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("state", &self.state)
            .field("bundles", &self.graph.names().collect::<Vec<_>>())
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        let providers = Arc::new(ProviderRegistry::new());
        let services = InstanceRegistry::with_names(
            providers.clone(),
            options.provider_suffix.clone(),
            options.injector_name.clone(),
        );

        Self {
            options,
            providers,
            services,
            graph: BundleGraph::new(),
            state: BootState::NotBooted,
        }
    }

    /// Loads a bundle and registers its components, replacing any bundle of the same name
    ///
    /// Components registered before a failing one stay registered.
    pub fn load_bundle(&mut self, bundle: Bundle) -> Result<&mut Self, LoadError> {
        if self.is_booted() {
            return Err(LoadError::AlreadyBooted);
        }

        if bundle.name().trim().is_empty() {
            return Err(LoadError::InvalidName(bundle.name().to_string()));
        }

        for component in bundle.declared_components() {
            component
                .definition(&self.options.provider_suffix)
                .and_then(|(name, definition)| {
                    self.providers
                        .register(name, definition)
                        .map_err(ComponentError::from)
                })
                .map_err(|source| LoadError::Component {
                    bundle: bundle.name().to_string(),
                    source,
                })?;
        }

        tracing::debug!(
            "Loaded bundle '{}' with {} components",
            bundle.name(),
            bundle.declared_components().len()
        );
        if let Some(replaced) = self.graph.insert(bundle) {
            tracing::debug!("Bundle '{}' replaced an earlier definition", replaced.name());
        }

        Ok(self)
    }

    /// Registers a constant, injectable as provider and as service under `name`
    pub fn register_external<T: Injectable>(
        &self,
        name: impl Into<String>,
        value: T,
    ) -> Result<(), RegisterError> {
        self.providers.register(name, ProviderDef::value(value))
    }

    /// Registers a provider which is already instantiated
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        provided: Provided,
    ) -> Result<(), RegisterError> {
        self.providers.register(name, ProviderDef::Value(provided))
    }

    pub fn bundle(&self, name: &str) -> Result<&Bundle, GraphError> {
        self.graph.get(name)
    }

    /// All loaded bundles, in dependency order
    pub fn bundles(&self) -> Result<Vec<&Bundle>, GraphError> {
        self.graph.ordered()
    }

    /// Reports every unknown dependency and cycle between the loaded bundles
    pub fn check(&self) -> Result<(), GraphErrors> {
        self.graph.check()
    }

    pub fn is_booted(&self) -> bool {
        self.state == BootState::Booted
    }

    /// Boots the application
    ///
    /// Callbacks run one at a time. A future returned by an async callback is
    /// awaited before the next callback starts. The first failure aborts the boot,
    /// and the container stays not booted.
    pub async fn boot(&mut self) -> Result<(), BootError> {
        if self.is_booted() {
            return Err(BootError::AlreadyBooted);
        }

        if self.graph.is_empty() {
            tracing::warn!("Booting application without any bundles");
        } else {
            tracing::debug!("Booting application with {} bundles", self.graph.len());
        }

        let result = async {
            self.run_phase(Phase::Config).await?;
            self.providers.instantiate_all()?;
            self.run_phase(Phase::Run).await
        }
        .await;

        if let Err(error) = &result {
            tracing::error!("Failed to boot application: {error}");
            return result;
        }

        self.state = BootState::Booted;
        tracing::debug!("Application booted");
        Ok(())
    }

    async fn run_phase(&self, phase: Phase) -> Result<(), BootError> {
        let order = self
            .graph
            .ordered()
            .map_err(|source| BootError::Graph { phase, source })?;

        tracing::debug!("Starting {phase} phase");
        for bundle in order {
            let Some(callback) = bundle.callback(phase) else {
                continue;
            };

            tracing::debug!("Running {phase} callback of bundle '{}'", bundle.name());
            let pending = match phase {
                Phase::Config => self.providers.invoke(callback),
                Phase::Run => self.services.invoke(callback),
            }
            .map_err(|source| BootError::Callback {
                bundle: bundle.name().to_string(),
                phase,
                source,
            })?;

            if let Some(future) = pending {
                tracing::trace!("Waiting for {phase} callback of bundle '{}'", bundle.name());
                future.await.map_err(|error| BootError::Settle {
                    bundle: bundle.name().to_string(),
                    phase,
                    error,
                })?;
            }
        }

        Ok(())
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn services(&self) -> &Arc<InstanceRegistry> {
        &self.services
    }

    /// Handle to the services, the same one injected under the injector name
    pub fn injector(&self) -> Injector {
        self.services.injector()
    }
}
