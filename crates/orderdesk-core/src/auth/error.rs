use thiserror::Error;

use crate::api::ApiError;

/// Failures surfaced by explicit session operations.
///
/// Silent re-authentication on startup never produces one of these; its
/// failures become a transition to `Unauthenticated`.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("This account is disabled")]
    AccountDisabled,

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("No stored session")]
    NoSession,

    #[error("Unable to reach the server: {0}")]
    Network(String),

    #[error("Failed to store credentials: {0}")]
    Storage(String),

    #[error("Login was superseded by a logout")]
    Superseded,

    #[error("Login failed: {0}")]
    Unexpected(String),
}

impl AuthError {
    /// Classify a failed login or profile call
    pub fn classify(err: &anyhow::Error) -> Self {
        if let Some(api_err) = err.downcast_ref::<ApiError>() {
            return match api_err {
                ApiError::Unauthorized => AuthError::InvalidCredentials,
                ApiError::AccessDenied(_) => AuthError::AccountDisabled,
                ApiError::NetworkError(e) => AuthError::Network(e.to_string()),
                other => AuthError::Unexpected(other.to_string()),
            };
        }
        if let Some(e) = err.downcast_ref::<reqwest::Error>() {
            return AuthError::Network(e.to_string());
        }
        AuthError::Unexpected(format!("{:#}", err))
    }

    pub fn storage(err: &anyhow::Error) -> Self {
        AuthError::Storage(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_errors() {
        let err: anyhow::Error = ApiError::Unauthorized.into();
        assert!(matches!(AuthError::classify(&err), AuthError::InvalidCredentials));

        let err: anyhow::Error = ApiError::AccessDenied("User is disabled".into()).into();
        assert!(matches!(AuthError::classify(&err), AuthError::AccountDisabled));

        let err: anyhow::Error = ApiError::ServerError("boom".into()).into();
        assert!(matches!(AuthError::classify(&err), AuthError::Unexpected(_)));
    }

    #[test]
    fn test_classify_keeps_context_chain() {
        let err = anyhow::anyhow!("disk full").context("Failed to write tokens");
        match AuthError::classify(&err) {
            AuthError::Unexpected(msg) => assert!(msg.contains("disk full")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
