use flashcards_core::model::{FlashcardId, StudySetId};

use crate::error::ApiError;

pub mod cards;
pub mod sets;

pub async fn health() -> &'static str {
    "Home page"
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("not found")
}

fn parse_set_id(raw: &str) -> Result<StudySetId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("invalid study set id".to_string()))
}

fn parse_card_id(raw: &str) -> Result<FlashcardId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("invalid flashcard id".to_string()))
}
