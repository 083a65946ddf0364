use std::sync::Arc;

use thiserror::Error;

use crate::types::DynError;

/// Errors while extracting dependency names from a signature
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReflectError {
    /// The text does not contain a parameter list, so it can't describe a callable
    #[error("Signature must describe a callable, no parameter list found in '{0}'")]
    MissingParameterList(String),
    #[error("Parameter '{parameter}' of '{signature}' is not a plain name")]
    InvalidParameter { signature: String, parameter: String },
}

/// Errors when registering a provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("Provider name must be a non-empty string, got '{0}'")]
    InvalidName(String),
}

/// Errors when resolving a provider or a service
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Unknown provider: '{0}'")]
    UnknownProvider(String),
    #[error("Circular dependency in provider: '{0}'")]
    CircularProvider(String),
    #[error("Not allowed to inject provider '{0}'")]
    NotInjectable(String),
    #[error("Invalid provider instance produced for '{0}'")]
    NullProvider(String),
    /// A provider was left mid-instantiation by an earlier failure
    #[error("Error instantiating providers, '{0}' never finished instantiating")]
    IncompleteInstantiation(String),
    #[error("No suitable provider for '{0}'")]
    NoSuitableProvider(String),
    #[error("Circular dependency in service '{0}'")]
    CircularService(String),
    #[error("Service instance resolved to null: '{0}'")]
    NullService(String),
    #[error(transparent)]
    Reflect(#[from] ReflectError),
    #[error("Failed to downcast '{dependency}', required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        dependency: String,
        required_type: &'static str,
        actual_type: &'static str,
    },
    #[error("Argument {index} was requested but was never declared as a dependency")]
    MissingArgument { index: usize },
    #[error("Factory for provider '{provider}' failed - error: {error}")]
    FactoryFailed {
        provider: String,
        error: Arc<DynError>,
    },
    #[error("Accessor for service '{service}' failed - error: {error}")]
    AccessorFailed {
        service: String,
        error: Arc<DynError>,
    },
    /// A custom argument conversion refused the resolved value
    #[error("Dependency '{dependency}' was rejected - error: {error}")]
    Rejected {
        dependency: String,
        error: Arc<DynError>,
    },
    #[error("The injector handle outlived its container")]
    InjectorDropped,
}

/// Errors when invoking a callable with injected arguments
#[derive(Error, Debug)]
pub enum InjectError {
    /// One of the arguments could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The callable itself returned an error
    #[error("Error during injected call: {0}")]
    Failed(DynError),
}
