use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId},
};

use indexmap::IndexMap;

use crate::{
    callbacks::{CallbackRegistry, SingletonCallback},
    dependency_graph::DependencyGraph,
    disposal::{DisposableBean, DisposerTable},
    errors::{CreateError, DisposalError, DisposalErrors, RegisterError},
    types::{DynError, Injectable, Instance},
};

/// Registry of named, process-lifetime singletons
///
/// The registry owns three cooperating structures over one namespace of
/// string identifiers: the binding map with its in-creation tracking, the
/// post-creation callback lists, and the dependency graph that drives
/// teardown ordering. All of them sit behind a single lock; factories,
/// callbacks and disposers always run with that lock released, so they
/// may call back into the registry for other names without deadlocking.
pub struct SingletonRegistry {
    inner: Mutex<RegistryInner>,
    /// Signalled whenever a name leaves the in-creation set
    creation_done: Condvar,
}

#[derive(Default)]
struct RegistryInner {
    /// name -> instance, in first-bound order
    singletons: IndexMap<String, Instance>,
    /// Names whose factory is currently running, and on which thread
    in_creation: HashMap<String, ThreadId>,
    callbacks: CallbackRegistry,
    graph: DependencyGraph,
    disposers: DisposerTable,
    /// Set for the duration of `destroy_singletons`
    in_destruction: bool,
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for SingletonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        let mut map = f.debug_struct("SingletonRegistry");
        for (name, instance) in &inner.singletons {
            map.field(name.as_str(), &instance.info.type_name);
        }
        map.finish()
    }
}

impl SingletonRegistry {
    pub fn new() -> Self {
        SingletonRegistry {
            inner: Mutex::new(RegistryInner::default()),
            creation_done: Condvar::new(),
        }
    }

    /// Binds `name` to an already-built instance
    ///
    /// Fails if the name is bound to a different instance; binding the
    /// same instance again is an idempotent no-op. Post-creation
    /// callbacks for the name fire before this returns.
    pub fn register_singleton<T: Injectable>(
        &self,
        name: &str,
        instance: Arc<T>,
    ) -> Result<(), RegisterError> {
        let instance = Instance::from_arc(instance);

        let (instance, handlers) = {
            let mut inner = self.lock();
            Self::bind(&mut inner, name, instance)?
        };
        Self::dispatch(name, &instance, handlers);

        Ok(())
    }

    /// Pure lookup - never creates
    pub fn get_singleton(&self, name: &str) -> Option<Instance> {
        self.lock().singletons.get(name).cloned()
    }

    /// Returns the singleton bound to `name`, creating it if absent
    ///
    /// The factory is invoked at most once per name across all callers:
    /// concurrent callers racing on an absent name block until the winner
    /// finishes, then observe the winner's instance. A factory may call
    /// back into the registry for other names, and may even publish its
    /// own product through [`SingletonRegistry::register_singleton`]
    /// before returning - the explicitly registered instance wins. A
    /// factory transitively requesting its own name is rejected as a
    /// circular creation instead of deadlocking.
    pub fn get_or_create<F>(&self, name: &str, factory: F) -> Result<Instance, CreateError>
    where
        F: FnOnce() -> Result<Instance, DynError>,
    {
        let current = thread::current().id();
        let mut inner = self.lock();
        loop {
            if let Some(existing) = inner.singletons.get(name) {
                return Ok(existing.clone());
            }
            if inner.in_destruction {
                return Err(RegisterError::DestructionInProgress {
                    name: name.to_string(),
                }
                .into());
            }
            match inner.in_creation.get(name).copied() {
                Some(creator) if creator == current => {
                    return Err(CreateError::CircularCreation {
                        name: name.to_string(),
                    });
                }
                Some(_) => {
                    // Another thread owns the creation slot - wait for it
                    // and re-evaluate
                    inner = self
                        .creation_done
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => break,
            }
        }
        inner.in_creation.insert(name.to_string(), current);
        drop(inner);

        tracing::debug!("Creating singleton '{}'", name);
        // The factory runs unlocked so it can recurse into the registry.
        // The guard clears the marker on unwind - a panicking factory must
        // not leave waiters blocked on the creation slot forever.
        let mut guard = CreationGuard {
            registry: self,
            name,
            armed: true,
        };
        let produced = factory();
        guard.armed = false;
        drop(guard);

        let mut inner = self.lock();
        inner.in_creation.remove(name);
        self.creation_done.notify_all();

        match produced {
            Ok(instance) => {
                if let Some(registered) = inner.singletons.get(name) {
                    // The factory published its own product mid-construction;
                    // the registered instance wins over the return value
                    return Ok(registered.clone());
                }
                let (instance, handlers) = Self::bind(&mut inner, name, instance)?;
                drop(inner);
                Self::dispatch(name, &instance, handlers);
                Ok(instance)
            }
            Err(error) => {
                tracing::warn!("Factory for '{}' failed: {}", name, error);
                Err(CreateError::FactoryFailed {
                    name: name.to_string(),
                    error,
                })
            }
        }
    }

    /// Number of currently-bound names
    pub fn singleton_count(&self) -> usize {
        self.lock().singletons.len()
    }

    /// Currently-bound names, in first-bound order
    pub fn singleton_names(&self) -> Vec<String> {
        self.lock().singletons.keys().cloned().collect()
    }

    pub fn contains_singleton(&self, name: &str) -> bool {
        self.lock().singletons.contains_key(name)
    }

    /// Whether a factory for `name` is running right now
    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        self.lock().in_creation.contains_key(name)
    }

    /// Registers a handler for the moment `name`'s instance becomes
    /// available
    ///
    /// Fires immediately when the name is already bound; otherwise the
    /// handler is queued and fires at first binding. Either way, exactly
    /// once.
    pub fn add_singleton_callback<F>(&self, name: &str, handler: F)
    where
        F: FnOnce(&Instance) + Send + 'static,
    {
        let mut inner = self.lock();
        if let Some(instance) = inner.singletons.get(name).cloned() {
            drop(inner);
            handler(&instance);
        } else {
            inner.callbacks.add(name, Box::new(handler));
        }
    }

    /// Records that `dependent_name` depends on `name`
    pub fn register_dependent_bean(&self, name: &str, dependent_name: &str) {
        self.lock().graph.add(name, dependent_name);
    }

    /// Whether `other` transitively depends on `name`
    pub fn is_dependent(&self, name: &str, other: &str) -> bool {
        self.lock().graph.is_dependent(name, other)
    }

    /// Direct dependents of `name`, in recorded order
    pub fn dependent_beans(&self, name: &str) -> Vec<String> {
        self.lock().graph.dependents_of(name).to_vec()
    }

    /// Records (or replaces) the disposer to invoke for `name` at teardown
    pub fn register_disposable_bean(&self, name: &str, bean: Arc<dyn DisposableBean>) {
        self.lock().disposers.insert(name, bean);
    }

    /// Tears the registry down
    ///
    /// Disposers run in reverse registration order, except that the
    /// recorded dependents of a name are always disposed before the name
    /// itself (best-effort on cyclic graphs, each disposer exactly once).
    /// A failing disposer never aborts the sweep; failures are collected
    /// and reported together. Afterwards the bindings, callbacks, graph
    /// and disposer table are all cleared, and no singleton created
    /// mid-teardown survives the clear - registrations are rejected while
    /// the sweep is running.
    pub fn destroy_singletons(&self) -> Result<(), DisposalErrors> {
        let (disposers, graph) = {
            let mut inner = self.lock();
            if inner.in_destruction {
                // Teardown already running on another thread
                return Ok(());
            }
            inner.in_destruction = true;
            (inner.disposers.take(), inner.graph.clone())
        };

        tracing::debug!("Destroying {} disposable singleton(s)", disposers.len());
        let order: Vec<String> = disposers.iter().map(|(name, _)| name.clone()).collect();
        let mut table: HashMap<String, Arc<dyn DisposableBean>> = disposers.into_iter().collect();

        let mut disposed = HashSet::new();
        let mut errors = Vec::new();
        for name in order.iter().rev() {
            Self::destroy_bean(name, &graph, &mut table, &mut disposed, &mut errors);
        }

        let mut inner = self.lock();
        inner.singletons.clear();
        inner.callbacks.clear();
        inner.graph.clear();
        inner.in_destruction = false;
        drop(inner);
        tracing::debug!("Singleton registry cleared");

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DisposalErrors { errors })
        }
    }
}

impl SingletonRegistry {
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // A panicking callback or disposer must not brick the registry
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds name -> instance under the lock
    ///
    /// Returns the handlers to fire once the lock is released.
    fn bind(
        inner: &mut RegistryInner,
        name: &str,
        instance: Instance,
    ) -> Result<(Instance, Vec<SingletonCallback>), RegisterError> {
        if inner.in_destruction {
            return Err(RegisterError::DestructionInProgress {
                name: name.to_string(),
            });
        }
        if let Some(existing) = inner.singletons.get(name) {
            if existing.ptr_eq(&instance) {
                // Same allocation - idempotent, handlers were already
                // drained at first binding
                return Ok((existing.clone(), Vec::new()));
            }
            return Err(RegisterError::AlreadyBound {
                name: name.to_string(),
            });
        }

        tracing::debug!("Bound singleton '{}' ({})", name, instance.info.type_name);
        inner.singletons.insert(name.to_string(), instance.clone());
        let handlers = inner.callbacks.drain(name);
        Ok((instance, handlers))
    }

    fn dispatch(name: &str, instance: &Instance, handlers: Vec<SingletonCallback>) {
        if handlers.is_empty() {
            return;
        }
        tracing::debug!("Dispatching {} callback(s) for '{}'", handlers.len(), name);
        for handler in handlers {
            handler(instance);
        }
    }

    /// Disposes the recorded dependents of `name`, then `name` itself
    ///
    /// The visited set keeps cyclic graphs terminating and every disposer
    /// at exactly one invocation.
    fn destroy_bean(
        name: &str,
        graph: &DependencyGraph,
        table: &mut HashMap<String, Arc<dyn DisposableBean>>,
        disposed: &mut HashSet<String>,
        errors: &mut Vec<DisposalError>,
    ) {
        if !disposed.insert(name.to_string()) {
            return;
        }
        for dependent in graph.dependents_of(name) {
            Self::destroy_bean(dependent, graph, table, disposed, errors);
        }
        if let Some(bean) = table.remove(name) {
            tracing::debug!("Destroying singleton '{}'", name);
            if let Err(error) = bean.destroy() {
                tracing::error!("Disposer for '{}' failed: {}", name, error);
                errors.push(DisposalError {
                    name: name.to_string(),
                    error,
                });
            }
        }
    }
}

/// Clears a name's in-creation marker if the owning factory unwinds
struct CreationGuard<'a> {
    registry: &'a SingletonRegistry,
    name: &'a str,
    armed: bool,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.registry.lock();
        inner.in_creation.remove(self.name);
        self.registry.creation_done.notify_all();
    }
}
