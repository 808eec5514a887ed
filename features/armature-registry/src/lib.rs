//! Armature Registry is the innermost primitive of the Armature
//! object-assembly framework: a thread-safe registry of named,
//! process-lifetime singletons.
//!
//! The registry is split into three cooperating parts:
//! 1. [`SingletonRegistry`]: the authoritative name -> instance mapping
//!    with get-or-create semantics and in-creation tracking
//! 2. [`DependencyGraph`]: directed "depends-on" edges between names,
//!    with cycle-safe transitive reachability queries
//! 3. Disposal: per-name [`DisposableBean`] disposers, invoked in
//!    dependents-first order by a single teardown sweep
//!
//! Higher layers decide what exists and what depends on what; this crate
//! only guarantees identity (exactly one instance per name, ever), safe
//! concurrent creation, and orderly teardown.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use armature_registry::{Instance, SingletonRegistry};
//!
//! let registry = SingletonRegistry::new();
//!
//! // Hooks registered before creation fire at first binding
//! registry.add_singleton_callback("cache", |instance| {
//!     println!("cache is ready: {}", instance.info.type_name);
//! });
//!
//! let cache = registry
//!     .get_or_create("cache", || Ok(Instance::new(vec![0u8; 16])))
//!     .unwrap();
//!
//! assert!(registry.get_singleton("cache").unwrap().ptr_eq(&cache));
//! assert_eq!(registry.singleton_names(), vec!["cache"]);
//!
//! registry.destroy_singletons().unwrap();
//! assert_eq!(registry.singleton_count(), 0);
//! ```

pub mod callbacks;
pub mod dependency_graph;
pub mod disposal;
pub mod errors;
pub mod registry;
pub mod types;

pub use callbacks::SingletonCallback;
pub use dependency_graph::DependencyGraph;
pub use disposal::DisposableBean;
pub use errors::{CreateError, DisposalError, DisposalErrors, RegisterError};
pub use registry::SingletonRegistry;
pub use types::{DynError, Injectable, Instance, TypeInfo};
