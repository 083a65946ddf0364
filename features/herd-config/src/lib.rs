//! Herd Config provides a registry of typed configs that can be injected into
//! providers, services and bundle callbacks.
//!
//! Herd Config is split into two major parts:
//! 1. ConfigProvider: Used to create the registry of all configs
//! 2. Config<T>: A wrapper type to be able to resolve and retrieve configs
//!
//! # Examples
//!
//! ```rust
//! use herd_config::provider::ConfigProvider;
//!
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! let mut config_provider = ConfigProvider::new();
//! config_provider
//!     .add_config(AppConfig {
//!         host: "localhost".to_string(),
//!         port: 8080,
//!     })
//!     .unwrap();
//!
//! let retrieved = config_provider.require_config::<AppConfig>().unwrap();
//! assert_eq!(retrieved.host, "localhost");
//! assert_eq!(retrieved.port, 8080);
//! ```
//!
//! Register the provider into the container with
//! `container.register_external(ConfigProvider::DEPENDENCY_NAME, config_provider)`.

pub mod config;
pub mod errors;
pub mod provider;

pub use config::Config;
pub use errors::ConfigError;
pub use provider::ConfigProvider;
