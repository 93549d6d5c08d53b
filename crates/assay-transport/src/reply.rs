use assay_core::LedgerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A failed API call: status plus the `{ok:false, error}` body.
///
/// Conflicts never say whether the identity is active or already used, and
/// internal failures never leak their cause.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// Login words its auth failure differently from the operator routes.
    pub fn from_login(err: LedgerError) -> Self {
        match err {
            LedgerError::Auth => Self::new(StatusCode::UNAUTHORIZED, "Invalid password"),
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(message) => Self::bad_request(message),
            LedgerError::Auth => Self::unauthorized(),
            LedgerError::Conflict { .. } => {
                Self::new(StatusCode::CONFLICT, "950 number already in use")
            }
            LedgerError::NotFound => Self::new(StatusCode::NOT_FOUND, "Invalid token"),
            other => {
                tracing::error!(error = %other, "ledger operation failed");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "ok": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay_core::{Denial, Identity};

    #[test]
    fn ledger_errors_map_to_status_codes() {
        let identity = Identity::parse("95000001").unwrap();
        let cases = [
            (LedgerError::validation("Missing fields"), StatusCode::BAD_REQUEST),
            (LedgerError::Auth, StatusCode::UNAUTHORIZED),
            (
                LedgerError::Conflict {
                    identity,
                    reason: Denial::AlreadyUsed,
                },
                StatusCode::CONFLICT,
            ),
            (LedgerError::NotFound, StatusCode::NOT_FOUND),
            (LedgerError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LedgerError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn conflict_reasons_are_indistinguishable() {
        let id = Identity::parse("95000001").unwrap();
        let used = ApiError::from(LedgerError::Conflict {
            identity: id.clone(),
            reason: Denial::AlreadyUsed,
        });
        let active = ApiError::from(LedgerError::Conflict {
            identity: id,
            reason: Denial::AlreadyActive,
        });
        assert_eq!(used.message(), active.message());
    }

    #[test]
    fn login_auth_message() {
        let err = ApiError::from_login(LedgerError::Auth);
        assert_eq!(err.message(), "Invalid password");
        assert_eq!(ApiError::from(LedgerError::Auth).message(), "Unauthorized");
    }
}
