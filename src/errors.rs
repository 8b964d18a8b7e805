use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::HabitNotFound(_) => Self::not_found(err.to_string()),
            LedgerError::InvalidDay(_) => Self::bad_request(err.to_string()),
            _ => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures of a ledger call, seen from whoever issued it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("habit {0} not found")]
    HabitNotFound(String),
    #[error("invalid day {0:?}")]
    InvalidDay(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("ledger rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
