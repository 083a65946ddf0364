use std::{collections::BTreeMap, future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use herd_di::{DynError, Injectable, Injected, Instance};

use crate::component::Component;

/// Future returned by an async bundle callback
pub type PhaseFuture = BoxFuture<'static, Result<(), DynError>>;

/// A bundle callback, producing a future if it is async
pub type PhaseCallback = Injected<Option<PhaseFuture>>;

/// The two boot phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Callbacks receive providers
    Config,
    /// Callbacks receive services
    Run,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Config => f.write_str("config"),
            Phase::Run => f.write_str("run"),
        }
    }
}

/// A named unit of the application
///
/// Its components are registered when the bundle is loaded. At boot, the config
/// callback runs after the config callbacks of all dependencies, and the run
/// callback after their run callbacks.
///
/// ```rust
/// use std::sync::Arc;
/// use herd::{inject, Bundle, Component};
///
/// let bundle = Bundle::new("Mail")
///     .depends_on(["Core"])
///     .component(Component::value("SmtpHost", "localhost".to_string()))
///     .run(inject!(|SmtpHost: Arc<String>| {
///         tracing::info!("Sending mail through {SmtpHost}");
///         Ok(())
///     }));
///
/// assert_eq!(bundle.name(), "Mail");
/// assert_eq!(bundle.dependencies(), ["Core"]);
/// ```
#[derive(Clone, Debug)]
pub struct Bundle {
    name: String,
    depends: Vec<String>,
    config: Option<PhaseCallback>,
    run: Option<PhaseCallback>,
    components: Vec<Component>,
    properties: BTreeMap<String, Instance>,
}

impl Bundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends: Vec::new(),
            config: None,
            run: None,
            components: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds bundles whose callbacks must run before the ones of this bundle
    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(dependencies.into_iter().map(Into::into));
        self
    }

    /// Sets the config callback, invoked with providers
    pub fn config(mut self, callback: Injected<()>) -> Self {
        self.config = Some(callback.map(|()| None));
        self
    }

    /// Sets an async config callback, boot awaits it before moving on
    pub fn config_async<F>(mut self, callback: Injected<F>) -> Self
    where
        F: Future<Output = Result<(), DynError>> + Send + 'static,
    {
        self.config = Some(callback.map(|future| Some(future.boxed())));
        self
    }

    /// Sets the run callback, invoked with services
    pub fn run(mut self, callback: Injected<()>) -> Self {
        self.run = Some(callback.map(|()| None));
        self
    }

    /// Sets an async run callback, boot awaits it before moving on
    pub fn run_async<F>(mut self, callback: Injected<F>) -> Self
    where
        F: Future<Output = Result<(), DynError>> + Send + 'static,
    {
        self.run = Some(callback.map(|future| Some(future.boxed())));
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components.extend(components);
        self
    }

    /// Attaches an arbitrary value, kept with the bundle but never interpreted
    pub fn property<T: Injectable>(mut self, key: impl Into<String>, value: T) -> Self {
        self.properties.insert(key.into(), Instance::new(value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends
    }

    pub fn callback(&self, phase: Phase) -> Option<&PhaseCallback> {
        match phase {
            Phase::Config => self.config.as_ref(),
            Phase::Run => self.run.as_ref(),
        }
    }

    pub fn declared_components(&self) -> &[Component] {
        &self.components
    }

    /// Returns a property if it exists and has type `T`
    pub fn get_property<T: Injectable>(&self, key: &str) -> Option<Arc<T>> {
        self.properties.get(key)?.downcast().ok()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.properties.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use herd_di::{inject, Args};

    use super::*;

    #[test]
    fn sync_callbacks_produce_no_future() {
        let bundle = Bundle::new("Sync").config(inject!(|| Ok(())));

        let callback = bundle.callback(Phase::Config).unwrap();
        assert!(callback.call(Args::new(Vec::new())).unwrap().is_none());
        assert!(bundle.callback(Phase::Run).is_none());
    }

    #[test]
    fn async_callbacks_produce_their_future() {
        let bundle = Bundle::new("Async").run_async(inject!(|| Ok(async {
            Err::<(), DynError>("settled".into())
        })));

        let future = bundle
            .callback(Phase::Run)
            .unwrap()
            .call(Args::new(Vec::new()))
            .unwrap()
            .unwrap();
        assert_eq!(block_on(future).unwrap_err().to_string(), "settled");
    }

    #[test]
    fn properties_are_kept_verbatim() {
        let bundle = Bundle::new("Props")
            .property("version", "1.2.0")
            .property("retries", 3_u32);

        assert_eq!(*bundle.get_property::<&str>("version").unwrap(), "1.2.0");
        assert_eq!(*bundle.get_property::<u32>("retries").unwrap(), 3);
        assert!(bundle.get_property::<u64>("retries").is_none());
        assert!(bundle.get_property::<u32>("missing").is_none());

        let keys: Vec<&str> = bundle.properties().map(|(key, _)| key).collect();
        assert_eq!(keys, ["retries", "version"]);
    }

    #[test]
    fn dependencies_keep_their_order() {
        let bundle = Bundle::new("C").depends_on(["B", "A"]).depends_on(["D"]);
        assert_eq!(bundle.dependencies(), ["B", "A", "D"]);
    }
}
