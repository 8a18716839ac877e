//! HTTP adapter error types.

use nudge_domain::error::{DefinitionError, NudgeError};

/// Errors specific to the HTTP adapter.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request could not be sent or the response not read.
    #[error("request failed")]
    Request(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service answered with status {0}")]
    Status(reqwest::StatusCode),

    /// The response body was not the expected JSON shape.
    #[error("failed to parse response body")]
    Parse(#[source] reqwest::Error),

    /// A definition in the response uses a kind this engine does not know.
    #[error("automation definition rejected")]
    Definition(#[source] DefinitionError),
}

impl HttpError {
    /// Convert into a [`NudgeError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> NudgeError {
        match self {
            Self::Definition(err) => NudgeError::Definition(err),
            other => NudgeError::platform(other),
        }
    }
}

impl From<HttpError> for NudgeError {
    fn from(err: HttpError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_status_error() {
        let err = HttpError::Status(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "service answered with status 502 Bad Gateway");
    }

    #[test]
    fn should_convert_status_error_to_platform_error() {
        let err: NudgeError = HttpError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR).into();
        assert!(matches!(err, NudgeError::Platform(_)));
    }

    #[test]
    fn should_convert_definition_error_back_to_definition() {
        let err: NudgeError =
            HttpError::Definition(DefinitionError::UnknownAction("teleport".to_string())).into();
        assert!(matches!(err, NudgeError::Definition(_)));
    }
}
