//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! Adapter crates wrap their IO failures into [`NudgeError::Platform`]
//! at the port boundary so the engine core never sees transport types.

/// Top-level error for the nudge engine.
#[derive(Debug, thiserror::Error)]
pub enum NudgeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced object does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An automation definition could not be understood.
    #[error("definition error")]
    Definition(#[from] DefinitionError),

    /// A platform or transport operation failed (storage, network, page).
    #[error("platform error")]
    Platform(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl NudgeError {
    /// Wrap an adapter-side error as an opaque platform failure.
    pub fn platform<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Platform(Box::new(err))
    }
}

/// Violations of domain invariants.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The automation name is empty.
    #[error("name must not be empty")]
    EmptyName,
    /// The automation has no actions.
    #[error("automation must have at least one action")]
    NoActions,
}

/// A referenced object was not found.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of object, e.g. `"Automation"`.
    pub entity: &'static str,
    /// Identifier that failed to resolve.
    pub id: String,
}

/// A server-provided automation definition uses a kind this engine does
/// not know. Unknown kinds are a typed error, never a silent no-op.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// Unrecognized trigger type string.
    #[error("unknown trigger kind `{0}`")]
    UnknownTrigger(String),
    /// Unrecognized condition type string.
    #[error("unknown condition kind `{0}`")]
    UnknownCondition(String),
    /// Unrecognized action type string.
    #[error("unknown action kind `{0}`")]
    UnknownAction(String),
    /// A kind that requires configuration is missing a field.
    #[error("`{kind}` definition is missing `{field}`")]
    MissingField {
        /// The trigger/condition/action kind.
        kind: &'static str,
        /// The absent configuration field.
        field: &'static str,
    },
}
