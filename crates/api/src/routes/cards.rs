use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use flashcards_core::model::FileDraft;

use crate::dto::{FlashcardBody, FlashcardJson, FlashcardPatchBody};
use crate::error::ApiError;
use crate::routes::parse_card_id;
use crate::state::AppState;

/// Creates a card that no set references.
pub async fn create_card(
    State(state): State<AppState>,
    body: Result<Json<FlashcardBody>, JsonRejection>,
) -> Result<(StatusCode, Json<FlashcardJson>), ApiError> {
    let Json(body) = body?;
    let card = state.flashcards.create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(FlashcardJson::from(&card))))
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<FlashcardJson>, ApiError> {
    let card = state.flashcards.get(parse_card_id(&card_id)?).await?;
    Ok(Json(FlashcardJson::from(&card)))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    body: Result<Json<FlashcardPatchBody>, JsonRejection>,
) -> Result<Json<FlashcardJson>, ApiError> {
    let card_id = parse_card_id(&card_id)?;
    let Json(body) = body?;
    let card = state.flashcards.update(card_id, body.into()).await?;
    Ok(Json(FlashcardJson::from(&card)))
}

/// Deletes the card and drops it from any set still referencing it.
pub async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Json<FlashcardJson>, ApiError> {
    let card = state
        .study_sets
        .delete_card(parse_card_id(&card_id)?)
        .await?;
    Ok(Json(FlashcardJson::from(&card)))
}

/// Multipart upload: a `file` part and a `partOfPrompt` part of `true`/`false`.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<FlashcardJson>, ApiError> {
    let card_id = parse_card_id(&card_id)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut part_of_prompt = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let mime = field.content_type().unwrap_or_default().to_owned();
                let data = field.bytes().await?;
                file = Some((mime, data.to_vec()));
            }
            Some("partOfPrompt") => {
                let raw = field.text().await?;
                part_of_prompt = Some(parse_flag(&raw)?);
            }
            _ => {}
        }
    }

    let (mime_type, data) =
        file.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;
    let card = state
        .flashcards
        .attach_file(
            card_id,
            FileDraft {
                mime_type,
                data,
                part_of_prompt,
            },
        )
        .await?;
    Ok(Json(FlashcardJson::from(&card)))
}

fn parse_flag(raw: &str) -> Result<bool, ApiError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "partOfPrompt must be \"true\" or \"false\", got \"{other}\""
        ))),
    }
}
