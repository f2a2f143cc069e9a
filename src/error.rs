//! Defines the app level error type and its conversion to JSON responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::transaction::SubmissionReply;

/// The message sent to the client when a submission is missing a field.
pub const ALL_FIELDS_REQUIRED: &str = "All fields are required.";
/// The message sent to the client when a submission fails on the server.
pub const SERVER_ERROR_OCCURRED: &str = "Server error occurred.";
/// The message sent to the client when a multipart form has an unexpected file.
pub const UNEXPECTED_FIELD: &str = "Unexpected field.";
/// The message sent to the client when a multipart form cannot be parsed.
pub const INVALID_MULTIPART_FORM: &str = "Invalid multipart form.";
/// The message sent to the client when a horoscope request has no sign.
pub const SIGN_REQUIRED: &str = "Sign is required.";
/// The message sent to the client when a sign is not in the horoscope table.
pub const HOROSCOPE_NOT_FOUND: &str = "Horoscope not found.";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The transaction submission was missing the sender name, the
    /// transaction ID or the screenshot.
    #[error("the sender name, transaction ID and screenshot are all required")]
    MissingFields,

    /// The multipart form contained a file under a field other than the
    /// screenshot field, or more than one screenshot.
    #[error("unexpected file field \"{0}\"")]
    UnexpectedField(String),

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded screenshot could not be written to disk.
    ///
    /// The error string should only be logged on the server.
    #[error("could not store uploaded file: {0}")]
    UploadError(String),

    /// The horoscope request did not include a sign.
    #[error("no sign was provided")]
    MissingSign,

    /// The sign is not one of the twelve zodiac signs.
    #[error("\"{0}\" is not a zodiac sign")]
    UnknownSign(String),

    /// The requested route does not exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

/// The JSON body for failed lookups.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorReply {
    /// A short description of what went wrong.
    pub error: String,
}

impl ErrorReply {
    fn response(status_code: StatusCode, error: &str) -> Response {
        (
            status_code,
            Json(ErrorReply {
                error: error.to_owned(),
            }),
        )
            .into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::MissingFields => {
                SubmissionReply::failure(StatusCode::BAD_REQUEST, ALL_FIELDS_REQUIRED)
            }
            Error::UnexpectedField(_) => {
                SubmissionReply::failure(StatusCode::BAD_REQUEST, UNEXPECTED_FIELD)
            }
            Error::MultipartError(_) => {
                SubmissionReply::failure(StatusCode::BAD_REQUEST, INVALID_MULTIPART_FORM)
            }
            Error::MissingSign => ErrorReply::response(StatusCode::BAD_REQUEST, SIGN_REQUIRED),
            Error::UnknownSign(_) => {
                ErrorReply::response(StatusCode::NOT_FOUND, HOROSCOPE_NOT_FOUND)
            }
            Error::NotFound => ErrorReply::response(StatusCode::NOT_FOUND, "Not found."),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                SubmissionReply::failure(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_OCCURRED)
            }
        }
    }
}
