use axum::http::StatusCode;

use crate::application::ports::score_gateway::ScoreGatewayError;
use crate::application::use_cases::users::error::UserDirectoryError;

pub fn status_for(err: &UserDirectoryError) -> StatusCode {
    match err {
        UserDirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        UserDirectoryError::Conflict(_) => StatusCode::CONFLICT,
        UserDirectoryError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        UserDirectoryError::Storage(_) | UserDirectoryError::Credential(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        UserDirectoryError::Score(ScoreGatewayError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        UserDirectoryError::Score(ScoreGatewayError::Rejected { .. }) => StatusCode::BAD_GATEWAY,
    }
}

/// Logs server-side failures and maps the error to its response status.
pub fn into_status(err: UserDirectoryError) -> StatusCode {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = ?err, status = status.as_u16(), "user_request_failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "user_request_refused");
    }
    status
}
