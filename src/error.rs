use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::json;

/// Everything the tracker can fail with. Nothing here is recovered internally;
/// handlers turn it into a response and the caller decides whether to retry.
#[derive(Debug, Display)]
pub enum AttendanceError {
    /// Reading or appending to the sheet store failed.
    #[display(fmt = "sheet store unavailable: {}", _0)]
    Transport(String),

    /// A date/time cell (or a required column) could not be understood.
    #[display(fmt = "could not parse sheet data: {}", _0)]
    Parse(String),

    #[display(fmt = "date_end {} is before date_start {}", end, start)]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[display(fmt = "student not on roster: {}", _0)]
    UnknownStudent(String),
}

impl std::error::Error for AttendanceError {}

impl From<sqlx::Error> for AttendanceError {
    fn from(e: sqlx::Error) -> Self {
        AttendanceError::Transport(e.to_string())
    }
}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::Transport(_) => "transport_error",
            AttendanceError::Parse(_) => "parse_error",
            AttendanceError::InvalidRange { .. } => "invalid_range",
            AttendanceError::UnknownStudent(_) => "unknown_student",
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Transport(_) => StatusCode::BAD_GATEWAY,
            AttendanceError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AttendanceError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            AttendanceError::UnknownStudent(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AttendanceError::Transport(e) = self {
            tracing::error!(error = %e, "Sheet store request failed");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string()
            }
        }))
    }
}
