use std::{
    any::{Any, TypeId},
    sync::Arc,
};

/// Failures raised by caller-supplied factories and disposers
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// The registry is shared across arbitrary caller threads
/// So anything stored in it needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Type-erased handle to a named singleton's instance
///
/// Cloning the handle clones the `Arc`, never the object - a name is
/// bound to exactly one allocation for the registry's lifetime.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    pub fn from_arc<T: Injectable>(instance: Arc<T>) -> Self {
        Instance {
            info: TypeInfo::of::<T>(),
            instance,
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// Identity comparison - same allocation, not same value
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::as_ptr(&self.instance) as *const () == Arc::as_ptr(&other.instance) as *const ()
    }
}

impl std::fmt::Debug for Instance {
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
