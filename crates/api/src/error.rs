//! Error envelope.
//!
//! Every failure leaves the API as
//! `{"success": false, "error": {"code", "message", "details"?}}` with the
//! status of the underlying [`AppError`]. Server errors are logged here and
//! their message is replaced by a generic one.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bastion_core::{auth::PasswordError, permission::PermissionError};
use bastion_db::{
    db_error,
    repositories::{
        ModuleError, PermissionRepoError, RoleError, RolePermissionError, TenantError, UserError,
    },
};
use bastion_shared::{AppError, JwtError};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::Value;
use validator::ValidationErrors;

/// Error returned by handlers, extractors and the auth guard.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    details: Option<Value>,
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl ApiError {
    /// Attaches structured details to the error body.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The wrapped application error.
    #[must_use]
    pub const fn app_error(&self) -> &AppError {
        &self.error
    }

    /// Shorthand for `AppError::Validation`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// Shorthand for `AppError::BusinessRule`.
    #[must_use]
    pub fn business_rule(message: impl Into<String>) -> Self {
        AppError::BusinessRule(message.into()).into()
    }

    /// Shorthand for `AppError::Unauthorized`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into()).into()
    }

    /// Shorthand for `AppError::Forbidden`.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.error.is_server_error() {
            tracing::error!(error = %self.error, "Request failed");
        }

        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: self.error.error_code(),
                message: self.error.public_message(),
                details: if self.error.is_server_error() {
                    None
                } else {
                    self.details.as_ref()
                },
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        db_error(err).into()
    }
}

macro_rules! via_app_error {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for ApiError {
                fn from(err: $source) -> Self {
                    AppError::from(err).into()
                }
            }
        )+
    };
}

via_app_error!(
    JwtError,
    PasswordError,
    PermissionError,
    TenantError,
    ModuleError,
    PermissionRepoError,
    RoleError,
    RolePermissionError,
    UserError,
);

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string)
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }

        Self::validation("Request validation failed")
            .with_details(serde_json::to_value(fields).unwrap_or(Value::Null))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use validator::Validate;

    async fn body_json(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let (status, body) = body_json(AppError::NotFound("Role not found".into()).into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Role not found");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_server_errors_are_masked() {
        let (status, body) = body_json(
            ApiError::from(AppError::Database("relation \"users\" does not exist".into()))
                .with_details(serde_json::json!({"sql": "SELECT"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("details").is_none());
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
    }

    #[tokio::test]
    async fn test_validation_errors_carry_field_details() {
        let errors = Probe { name: "x".into() }.validate().unwrap_err();
        let (status, body) = body_json(errors.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["name"][0], "too short");
    }

    #[tokio::test]
    async fn test_expired_token_code() {
        let (status, body) = body_json(JwtError::Expired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
    }
}
