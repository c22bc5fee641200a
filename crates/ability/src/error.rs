use thiserror::Error;

/// Result type for the edges of the ability engine (parsing, configuration).
pub type AbilityResult<T> = Result<T, AbilityError>;

/// Errors raised at the boundary of the engine.
///
/// Compiling rules and answering `can` queries never fail; these variants only
/// cover input that has to be parsed before it reaches the compiler.
#[derive(Debug, Error)]
pub enum AbilityError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("unknown subject '{0}'")]
    UnknownSubject(String),

    #[error("invalid configuration value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
