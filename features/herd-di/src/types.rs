use std::{
    any::{Any, TypeId},
    fmt::Debug,
    sync::Arc,
};

/// Error type returned by factories, accessors and bundle callbacks
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// We assume that the container may be shared with a multithreaded async runtime
/// So anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type erased value held by one of the registries
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Instance {
            info: TypeInfo::of::<T>(),
            instance: value,
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// True if both handles point at the same underlying value
    pub fn same_as(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.instance), Arc::as_ptr(&other.instance))
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// Resolution state of a registry entry
pub(crate) enum Slot<T> {
    Unresolved,
    /// Someone up the call chain is resolving this entry right now
    InProgress,
    Resolved(T),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_reports_actual_type() {
        let instance = Instance::new(42_u32);

        assert_eq!(*instance.downcast::<u32>().unwrap(), 42);
        assert_eq!(instance.downcast::<String>().unwrap_err(), "u32");
    }

    #[test]
    fn clones_share_the_value() {
        let instance = Instance::new("shared".to_string());
        let other = Instance::new("shared".to_string());

        assert!(instance.same_as(&instance.clone()));
        assert!(!instance.same_as(&other));
    }
}
