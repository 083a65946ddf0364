use std::sync::{Arc, OnceLock};

use crate::{
    annotate::annotate,
    args::Args,
    errors::{InjectError, ReflectError, ResolveError},
    types::{DynError, Instance},
};

type InjectedFn<T> = dyn Fn(Args) -> Result<T, DynError> + Send + Sync;

/// A callable together with the names of the dependencies it is invoked with
///
/// Cloning is cheap, all clones share the callable and its reflected names.
pub struct Injected<T> {
    inner: Arc<InjectedInner<T>>,
}
struct InjectedInner<T> {
    /// Parameter list text, reflected the first time the names are needed
    signature: Option<String>,
    dependencies: OnceLock<Arc<[String]>>,
    call: Box<InjectedFn<T>>,
}

impl<T> Clone for Injected<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injected")
            .field("signature", &self.inner.signature)
            .field("dependencies", &self.inner.dependencies.get())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Injected<T> {
    /// Creates a callable with an explicit list of dependency names
    ///
    /// The list is used verbatim, no reflection ever happens.
    pub fn new<I, S, F>(dependencies: I, call: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Args) -> Result<T, DynError> + Send + Sync + 'static,
    {
        let dependencies: Arc<[String]> = dependencies.into_iter().map(Into::into).collect();
        Self {
            inner: Arc::new(InjectedInner {
                signature: None,
                dependencies: OnceLock::from(dependencies),
                call: Box::new(call),
            }),
        }
    }

    /// Creates a callable whose dependency names are read from its parameter list text
    ///
    /// See [annotate] for the accepted syntax. Used by the [inject](crate::inject) macro.
    pub fn from_signature<F>(signature: impl Into<String>, call: F) -> Self
    where
        F: Fn(Args) -> Result<T, DynError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(InjectedInner {
                signature: Some(signature.into()),
                dependencies: OnceLock::new(),
                call: Box::new(call),
            }),
        }
    }

    /// Returns the ordered dependency names, reflecting them on first use
    pub fn dependencies(&self) -> Result<&[String], ReflectError> {
        if let Some(dependencies) = self.inner.dependencies.get() {
            return Ok(dependencies);
        }

        let signature = self.inner.signature.as_deref().unwrap_or_default();
        let reflected: Arc<[String]> = annotate(signature)?.into();
        Ok(self.inner.dependencies.get_or_init(|| reflected))
    }

    /// Calls with already resolved arguments
    pub fn call(&self, args: Args) -> Result<T, DynError> {
        (self.inner.call)(args)
    }

    /// Returns a callable with the same dependencies, whose output is passed through `f`
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Injected<U> {
        let signature = self.inner.signature.clone();
        let dependencies = self.inner.dependencies.clone();
        Injected {
            inner: Arc::new(InjectedInner {
                signature,
                dependencies,
                call: Box::new(move |args| self.call(args).map(&f)),
            }),
        }
    }
}

/// Resolves every dependency of `injected` through `resolve`, then calls it
pub fn invoke_with<T: 'static>(
    injected: &Injected<T>,
    resolve: impl FnMut(&str) -> Result<Instance, ResolveError>,
) -> Result<T, InjectError> {
    let dependencies = injected.dependencies().map_err(ResolveError::from)?;
    let args = Args::resolve(dependencies, resolve)?;
    injected.call(args).map_err(InjectError::Failed)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn explicit_names_bypass_reflection() {
        let injected = Injected::new(["Greeting", "World"], |_| Ok(()));
        assert_eq!(injected.dependencies().unwrap(), ["Greeting", "World"]);
    }

    #[test]
    fn reflected_names_are_cached() {
        let injected = Injected::from_signature("(a1, _a2_)", |_| Ok(()));
        let first = injected.dependencies().unwrap().as_ptr();
        let second = injected.clone().dependencies().unwrap().as_ptr();

        assert_eq!(injected.dependencies().unwrap(), ["a1", "a2"]);
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_signature_fails_on_reflection() {
        let injected = Injected::from_signature("not callable", |_| Ok(()));
        assert!(matches!(
            injected.dependencies(),
            Err(ReflectError::MissingParameterList(_))
        ));
    }

    #[test]
    fn invoke_passes_arguments_in_declared_order() {
        let injected = Injected::new(["b", "a", "b"], |mut args| {
            let b: Arc<String> = args.take()?;
            let a: Arc<String> = args.take()?;
            let again: Arc<String> = args.take()?;
            Ok(format!("{b}{a}{again}"))
        });

        let resolved = AtomicUsize::new(0);
        let result = invoke_with(&injected, |name| {
            resolved.fetch_add(1, Ordering::SeqCst);
            Ok(Instance::new(name.to_uppercase()))
        })
        .unwrap();

        assert_eq!(result, "BAB");
        assert_eq!(resolved.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn map_keeps_dependencies() {
        let injected = Injected::from_signature("(value)", |mut args| {
            let value: Arc<u32> = args.take()?;
            Ok(*value)
        })
        .map(|value| value * 2);

        let result = invoke_with(&injected, |_| Ok(Instance::new(21_u32))).unwrap();
        assert_eq!(result, 42);
        assert_eq!(injected.dependencies().unwrap(), ["value"]);
    }

    #[test]
    fn callable_errors_are_reported_as_failed() {
        let injected: Injected<()> = Injected::new(Vec::<String>::new(), |_| Err("boom".into()));
        let error = invoke_with(&injected, |_| unreachable!()).unwrap_err();
        assert!(matches!(error, InjectError::Failed(e) if e.to_string() == "boom"));
    }
}
