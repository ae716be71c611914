use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate email")]
    DuplicateEmail,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Upload failed for {0}")]
    UploadFailed(String),

    #[error("Storage error: {0}")]
    Storage(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        // Infrastructure failures keep their detail in the log and hand the
        // client a generic localized message.
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                "يوجد طلب مسجل بهذا البريد الإلكتروني مسبقاً".to_string(),
            ),
            Error::InvalidStatus(value) => {
                tracing::warn!(status = %value, "rejected unknown application status");
                (
                    StatusCode::BAD_REQUEST,
                    "حالة الطلب غير صحيحة".to_string(),
                )
            }
            Error::UploadFailed(slot) => {
                tracing::error!(file = %slot, "file upload failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("فشل في رفع الملف: {}", slot),
                )
            }
            Error::Storage(err) => {
                tracing::error!(error = %err, "storage backend failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "حدث خطأ أثناء معالجة الطلب".to_string(),
                )
            }
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Reqwest(err) => {
                tracing::error!(error = %err, "outbound HTTP failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "حدث خطأ أثناء الاتصال بخدمة خارجية".to_string(),
                )
            }
            Error::Config(msg) | Error::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "حدث خطأ غير متوقع".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("الطلب غير موجود".to_string()),
            other => Error::Storage(other),
        }
    }
}
