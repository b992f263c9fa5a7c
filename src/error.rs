use thiserror::Error;

/// Errors that can occur when using EventStore
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Failed to acquire the lock guarding the process-wide store
    #[error("Failed to acquire lock")]
    LockError,
    /// No entry has been registered under the requested name
    #[error("No entry named '{0}' in store")]
    KeyNotFound(String),
    /// The entry exists but was registered with a different type
    #[error("Type mismatch for '{name}': requested {expected}, stored {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
    /// An entry with this name already exists
    #[error("An entry named '{0}' is already registered")]
    DuplicateName(String),
    /// Entry names must not be empty
    #[error("Entry names must not be empty")]
    EmptyName,
    /// The type name has not been declared to the catalog
    #[error("Type '{0}' is not declared in the catalog")]
    UnknownType(String),
    /// The type name contains characters reserved for collection names
    #[error("Invalid type name '{0}'")]
    InvalidTypeName(String),
    /// A different Rust type is already bound to this type name
    #[error("Type name '{0}' is already bound to a different type")]
    TypeNameCollision(String),
}
