use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use tracing::info;

use crate::dto::{
    DeletedSetJson, FlashcardBody, FlashcardJson, FlashcardPatchBody, LinkedCardJson,
    QuizScoreBody, RemovedCardJson, StudySetJson, StudySetListJson, TitleBody, removal_outcome,
};
use crate::error::ApiError;
use crate::routes::{parse_card_id, parse_set_id};
use crate::state::AppState;

pub async fn list_sets(State(state): State<AppState>) -> Result<Json<StudySetListJson>, ApiError> {
    let sets = state.study_sets.list().await?;
    Ok(Json(StudySetListJson {
        study_sets: sets.iter().map(StudySetJson::from).collect(),
    }))
}

pub async fn create_set(
    State(state): State<AppState>,
    body: Result<Json<TitleBody>, JsonRejection>,
) -> Result<Json<StudySetJson>, ApiError> {
    let Json(body) = body?;
    let set = state.study_sets.create(body.title).await?;
    info!(set_id = %set.id(), "study set created");
    Ok(Json(StudySetJson::from(&set)))
}

pub async fn get_set(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
) -> Result<Json<StudySetJson>, ApiError> {
    let set = state.study_sets.get(parse_set_id(&set_id)?).await?;
    Ok(Json(StudySetJson::from(&set)))
}

pub async fn rename_set(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
    body: Result<Json<TitleBody>, JsonRejection>,
) -> Result<Json<StudySetJson>, ApiError> {
    let set_id = parse_set_id(&set_id)?;
    let Json(body) = body?;
    let set = state.study_sets.rename(set_id, body.title).await?;
    Ok(Json(StudySetJson::from(&set)))
}

pub async fn delete_set(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
) -> Result<Json<DeletedSetJson>, ApiError> {
    let report = state.study_sets.delete(parse_set_id(&set_id)?).await?;
    Ok(Json(DeletedSetJson::from(&report)))
}

pub async fn set_cards(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
) -> Result<Json<Vec<FlashcardJson>>, ApiError> {
    let cards = state.study_sets.cards_for_set(parse_set_id(&set_id)?).await?;
    Ok(Json(cards.iter().map(FlashcardJson::from).collect()))
}

pub async fn add_card(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
    body: Result<Json<FlashcardBody>, JsonRejection>,
) -> Result<Json<LinkedCardJson>, ApiError> {
    let set_id = parse_set_id(&set_id)?;
    let Json(body) = body?;
    let linked = state.study_sets.add_card(set_id, body.into()).await?;
    Ok(Json(LinkedCardJson {
        set: StudySetJson::from(&linked.set),
        card: FlashcardJson::from(&linked.card),
    }))
}

pub async fn remove_card(
    State(state): State<AppState>,
    Path((set_id, card_id)): Path<(String, String)>,
) -> Result<Json<RemovedCardJson>, ApiError> {
    let set_id = parse_set_id(&set_id)?;
    let card_id = parse_card_id(&card_id)?;
    let removed = state.study_sets.remove_card(set_id, card_id).await?;
    Ok(Json(RemovedCardJson {
        set: StudySetJson::from(&removed.set),
        outcome: removal_outcome(removed.outcome),
    }))
}

pub async fn update_card_in_set(
    State(state): State<AppState>,
    Path((set_id, card_id)): Path<(String, String)>,
    body: Result<Json<FlashcardPatchBody>, JsonRejection>,
) -> Result<Json<FlashcardJson>, ApiError> {
    let set_id = parse_set_id(&set_id)?;
    let card_id = parse_card_id(&card_id)?;
    let Json(body) = body?;
    let card = state
        .study_sets
        .update_card(set_id, card_id, body.into())
        .await?;
    Ok(Json(FlashcardJson::from(&card)))
}

pub async fn record_quiz_score(
    State(state): State<AppState>,
    Path(set_id): Path<String>,
    body: Result<Json<QuizScoreBody>, JsonRejection>,
) -> Result<Json<StudySetJson>, ApiError> {
    let set_id = parse_set_id(&set_id)?;
    let Json(body) = body?;
    let fraction = body
        .as_fraction()
        .ok_or_else(|| ApiError::Unprocessable("addedQuizScore must be a number".to_string()))?;
    let set = state.study_sets.record_quiz_score(set_id, fraction).await?;
    Ok(Json(StudySetJson::from(&set)))
}
