use crate::api::envelope::Envelope;
use crate::ledger::LedgerError;
use crate::model::leave::BalanceError;
use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;

/// Every failure a handler can return. Rendered as the response envelope
/// with `success: false`.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    InsufficientBalance(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    BadGateway(String),
    #[display(fmt = "{}", _0)]
    ServiceUnavailable(String),
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    /// Log `err` server-side and hide it from the client.
    pub fn internal(err: &dyn std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        ApiError::Internal
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InsufficientBalance(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(Envelope::<()>::failure(self.to_string()))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            StoreError::Conflict(what) => ApiError::Conflict(what),
            StoreError::Balance(e) => match e {
                BalanceError::Insufficient { .. } => ApiError::InsufficientBalance(e.to_string()),
                BalanceError::HoldMissing { .. } => {
                    ApiError::internal(&e, "Leave balance out of step with request")
                }
            },
            StoreError::Unexpected(e) => ApiError::internal(&e, "Store operation failed"),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(m) => ApiError::Validation(m),
            LedgerError::InsufficientBalance {
                requested,
                available,
            } => ApiError::InsufficientBalance(
                BalanceError::Insufficient {
                    requested,
                    available,
                }
                .to_string(),
            ),
            LedgerError::NotFound(m) => ApiError::NotFound(m),
            LedgerError::Forbidden(m) => ApiError::Forbidden(m),
            LedgerError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_status_codes() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err: ApiError = StoreError::Unexpected(anyhow::anyhow!("connection reset")).into();
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn insufficient_balance_is_a_bad_request() {
        let err: ApiError = StoreError::Balance(BalanceError::Insufficient {
            requested: 5,
            available: 2,
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("requested 5"));
    }

    #[test]
    fn ledger_errors_keep_their_category() {
        let err: ApiError = LedgerError::NotFound("gone".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "gone");

        let err: ApiError = LedgerError::InsufficientBalance {
            requested: 4,
            available: 1,
        }
        .into();
        assert!(matches!(err, ApiError::InsufficientBalance(_)));
        assert_eq!(
            err.to_string(),
            "insufficient leave balance: requested 4 day(s), 1 available"
        );

        let err: ApiError = LedgerError::Store(StoreError::Conflict("dup".into())).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
