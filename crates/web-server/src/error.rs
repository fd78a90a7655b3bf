use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use api_client::ApiError;
use core_types::CoreError;
use database::DbError;
use mailer::error::MailerError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] CoreError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
    #[error("Database error: {0}")]
    Database(DbError),
    #[error("External API error: {0}")]
    Api(#[from] ApiError),
    #[error("Mailer error: {0}")]
    Mail(#[from] MailerError),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => AppError::NotFound("The requested resource does not exist".to_string()),
            DbError::UniqueViolation(constraint) => AppError::Conflict(conflict_message(&constraint).to_string()),
            other => AppError::Database(other),
        }
    }
}

/// Client-facing text for a violated unique constraint.
fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "An account with this email already exists",
        "participants_user_id_key" => "This account already has a participant profile",
        "participants_slug_key" => "This participant name is already taken",
        "hub_participants_participant_id_key" => "The participant already belongs to a hub",
        "event_days_date_key" => "There is already an event day on this date",
        _ => "The record conflicts with existing data",
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(err) => {
                let body = Json(json!({ "error": err.to_string(), "field": err.field() }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required".to_string()),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Api(api_err) => {
                tracing::error!(error = ?api_err, "External API error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An upstream service failed".to_string(),
                )
            }
            AppError::Mail(mail_err) => {
                tracing::error!(error = ?mail_err, "Mailer error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sending email failed".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_map_to_statuses() {
        let not_found: AppError = DbError::NotFound.into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let taken: AppError = DbError::UniqueViolation("participants_slug_key".to_string()).into();
        assert_eq!(taken.into_response().status(), StatusCode::CONFLICT);

        let broken: AppError = DbError::ConnectionConfigError("DATABASE_URL".to_string()).into();
        assert_eq!(broken.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unique_violations_do_not_leak_constraint_names() {
        let taken: AppError = DbError::UniqueViolation("users_email_key".to_string()).into();
        assert!(matches!(&taken, AppError::Conflict(m) if m == "An account with this email already exists"));

        let unknown: AppError = DbError::UniqueViolation("route_stops_pkey".to_string()).into();
        match unknown {
            AppError::Conflict(message) => assert!(!message.contains("pkey")),
            other => panic!("expected a conflict, got {other:?}"),
        }
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err: AppError = CoreError::invalid("email", "is not a valid address").into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
