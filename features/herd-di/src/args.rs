use std::{any::type_name, sync::Arc};

use crate::{
    errors::ResolveError,
    types::{Injectable, Instance},
};

/// Resolved arguments, handed positionally to an injected callable
pub struct Args {
    values: std::vec::IntoIter<(String, Instance)>,
    position: usize,
}

impl Args {
    pub fn new(values: Vec<(String, Instance)>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Resolves each name in order
    pub(crate) fn resolve(
        names: &[String],
        mut resolve: impl FnMut(&str) -> Result<Instance, ResolveError>,
    ) -> Result<Self, ResolveError> {
        names
            .iter()
            .map(|name| {
                tracing::trace!("Resolving dependency '{name}'");
                resolve(name).map(|instance| (name.clone(), instance))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Takes the next argument, converting it to the requested type
    pub fn take<A: FromArg>(&mut self) -> Result<A, ResolveError> {
        let index = self.position;
        let (name, instance) = self
            .values
            .next()
            .ok_or(ResolveError::MissingArgument { index })?;
        self.position += 1;

        A::from_arg(&name, instance)
    }
}

/// Conversion from a resolved dependency into a callable's parameter type
pub trait FromArg: Sized {
    fn from_arg(name: &str, instance: Instance) -> Result<Self, ResolveError>;
}

impl<T: Injectable> FromArg for Arc<T> {
    fn from_arg(name: &str, instance: Instance) -> Result<Self, ResolveError> {
        instance
            .downcast::<T>()
            .map_err(|actual_type| ResolveError::DowncastFailed {
                dependency: name.to_string(),
                required_type: type_name::<T>(),
                actual_type,
            })
    }
}

impl FromArg for Instance {
    fn from_arg(_: &str, instance: Instance) -> Result<Self, ResolveError> {
        Ok(instance)
    }
}
