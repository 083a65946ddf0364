use herd_di::{DynError, InjectError, RegisterError, ResolveError};
use thiserror::Error;

use crate::bundle::Phase;

/// Errors in a component declaration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("Invalid component name: '{0}'")]
    InvalidName(String),
    #[error("No definition found for component '{0}'")]
    MissingDefinition(String),
    /// More than one of provider, service and value was declared
    #[error("Component '{component}' has more than one definition: {shapes:?}")]
    AmbiguousDefinition {
        component: String,
        shapes: Vec<&'static str>,
    },
    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Errors when loading a bundle into the container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Cannot load bundle after booting")]
    AlreadyBooted,
    #[error("Invalid bundle name: '{0}'")]
    InvalidName(String),
    #[error("Error loading bundle '{bundle}': {source}")]
    Component {
        bundle: String,
        #[source]
        source: ComponentError,
    },
}

/// Errors in the bundle dependency graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown bundle: '{0}'")]
    UnknownBundle(String),
    #[error("'{required_by}' depends on '{dependency}' but it was never loaded")]
    MissingDependency {
        dependency: String,
        required_by: String,
    },
    #[error("Circular dependency in bundle '{name}' through {chain:?}")]
    CircularDependency { name: String, chain: Vec<String> },
}

/// Every issue found by [BundleGraph::check](crate::graph::BundleGraph::check)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct GraphErrors {
    pub errors: Vec<GraphError>,
}
impl std::fmt::Display for GraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The bundle graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

/// Errors while booting the container
#[derive(Error, Debug)]
pub enum BootError {
    #[error("Application has already booted")]
    AlreadyBooted,
    /// The bundles could not be ordered, no callback of the phase ran
    #[error("Could not order bundles for the {phase} phase: {source}")]
    Graph {
        phase: Phase,
        #[source]
        source: GraphError,
    },
    /// A provider failed while instantiating the remaining providers
    #[error("Error instantiating providers: {0}")]
    Instantiate(#[from] ResolveError),
    /// A callback could not be invoked or returned an error
    #[error("The {phase} callback of bundle '{bundle}' failed: {source}")]
    Callback {
        bundle: String,
        phase: Phase,
        #[source]
        source: InjectError,
    },
    /// The future returned by an async callback resolved to an error
    #[error("The {phase} callback of bundle '{bundle}' settled with an error: {error}")]
    Settle {
        bundle: String,
        phase: Phase,
        error: DynError,
    },
}
