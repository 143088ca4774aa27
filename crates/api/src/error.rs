use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flashcards_core::model::{FlashcardId, StudySetError};
use serde::Serialize;
use services::{FlashcardServiceError, StudySetServiceError};
use thiserror::Error;
use tracing::error;

pub const SET_NOT_FOUND: &str = "Study Set does not exist";
pub const CARD_NOT_FOUND: &str = "Flashcard does not exist";

/// Every failure a handler can return. Rendered as
/// `{"error": {"status": .., "message": ..}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{message}")]
    PartialCascade {
        message: String,
        failed: Vec<FlashcardId>,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PartialCascade { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn internal(err: &impl std::fmt::Display) -> Self {
        error!(error = %err, "request failed");
        ApiError::Internal("internal server error".to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_cards: Option<Vec<FlashcardId>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let failed_cards = match self {
            ApiError::PartialCascade { failed, .. } => Some(failed),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                status: status.as_u16(),
                message,
                failed_cards,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<FlashcardServiceError> for ApiError {
    fn from(err: FlashcardServiceError) -> Self {
        match err {
            FlashcardServiceError::NotFound(_) => ApiError::NotFound(CARD_NOT_FOUND),
            FlashcardServiceError::Flashcard(e) => ApiError::Unprocessable(e.to_string()),
            FlashcardServiceError::Media(e) => ApiError::Unprocessable(e.to_string()),
            other => ApiError::internal(&other),
        }
    }
}

impl From<StudySetServiceError> for ApiError {
    fn from(err: StudySetServiceError) -> Self {
        match err {
            StudySetServiceError::SetNotFound(_) => ApiError::NotFound(SET_NOT_FOUND),
            StudySetServiceError::StudySet(StudySetError::EmptyTitle) => {
                ApiError::BadRequest(StudySetError::EmptyTitle.to_string())
            }
            StudySetServiceError::StudySet(e) => ApiError::Unprocessable(e.to_string()),
            StudySetServiceError::Flashcard(e) => e.into(),
            StudySetServiceError::PartialCascade {
                set_id,
                failed,
                total,
            } => ApiError::PartialCascade {
                message: format!(
                    "Study Set {set_id} was deleted but {} of {total} flashcards could not be deleted",
                    failed.len()
                ),
                failed,
            },
            other => ApiError::internal(&other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}
