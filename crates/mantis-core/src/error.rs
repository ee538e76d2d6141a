//! Error types for mantis.

use thiserror::Error;

/// Result type alias using mantis's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mantis operations.
///
/// The first three variants are caller-distinguishable outcomes
/// (400 / 404 / 409 at the HTTP boundary); everything else is an internal
/// fault that gets logged and masked.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input (bad filter value, unknown status id, missing field)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The row changed between the existence probe and the update
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a not-found error on a numeric id.
    ///
    /// Phrased as "no existe" so it reads right for every entity name.
    pub fn not_found(entity: &str, id: i64) -> Self {
        Error::NotFound(format!("{} {} no existe", entity, id))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("cotizacion 7".to_string());
        assert_eq!(err.to_string(), "Not found: cotizacion 7");
    }

    #[test]
    fn test_not_found_helper_includes_entity_and_id() {
        let err = Error::not_found("Cotización", 42);
        assert_eq!(err.to_string(), "Not found: Cotización 42 no existe");
        let err = Error::not_found("Equipo", 3);
        assert_eq!(err.to_string(), "Not found: Equipo 3 no existe");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("id_estado inválido".to_string());
        assert_eq!(err.to_string(), "Invalid input: id_estado inválido");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("estado modificado".to_string());
        assert_eq!(err.to_string(), "Conflict: estado modificado");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("DB_PORT must be a number".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: DB_PORT must be a number"
        );
    }


    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
