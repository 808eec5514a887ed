use thiserror::Error;

use crate::types::DynError;

/// Errors when binding an instance to a name
#[derive(thiserror::Error, Debug, Clone)]
pub enum RegisterError {
    /// The name is already bound to a different instance
    #[error("'{name}' is already bound to a different instance")]
    AlreadyBound { name: String },
    /// The registry is draining its singletons
    #[error("Cannot bind '{name}' while the registry is destroying its singletons")]
    DestructionInProgress { name: String },
}

/// Errors while creating a singleton through a factory
#[derive(thiserror::Error, Debug)]
pub enum CreateError {
    /// The name's factory transitively requested its own product
    #[error("'{name}' is currently in creation - a factory cannot request its own product")]
    CircularCreation { name: String },
    /// The caller-supplied factory failed
    #[error("Factory for '{name}' failed - error: {error:?}")]
    FactoryFailed { name: String, error: DynError },
    /// Binding the factory's product was rejected
    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// A single disposer failure during teardown
#[derive(Error, Debug)]
#[error("Disposer for '{name}' failed - error: {error:?}")]
pub struct DisposalError {
    pub name: String,
    pub error: DynError,
}

impl std::fmt::Display for DisposalErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("Teardown finished with one or more disposer failures:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

/// One or more disposers failed; teardown still ran to completion
#[derive(Error, Debug)]
pub struct DisposalErrors {
    pub errors: Vec<DisposalError>,
}
