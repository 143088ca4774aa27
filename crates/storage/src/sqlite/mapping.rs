use flashcards_core::model::{
    CardFile, Flashcard, FlashcardId, QuizScore, ResponseType, StudySet, StudySetId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn flashcard_id_from_i64(v: i64) -> Result<FlashcardId, StorageError> {
    Ok(FlashcardId::new(i64_to_u64("flashcard_id", v)?))
}

pub(crate) fn study_set_id_from_i64(v: i64) -> Result<StudySetId, StorageError> {
    Ok(StudySetId::new(i64_to_u64("study_set_id", v)?))
}

pub(crate) fn map_flashcard_row(row: &SqliteRow) -> Result<Flashcard, StorageError> {
    let kind: String = row.try_get("user_response_type").map_err(ser)?;
    let user_response_type = kind.parse::<ResponseType>().map_err(ser)?;

    let file = match row.try_get::<Option<String>, _>("file_type").map_err(ser)? {
        None => None,
        Some(mime) => {
            let data = row
                .try_get::<Option<Vec<u8>>, _>("file_data")
                .map_err(ser)?
                .ok_or_else(|| StorageError::Serialization("missing file_data".into()))?;
            let part_of_prompt = row
                .try_get::<Option<i64>, _>("file_part_of_prompt")
                .map_err(ser)?
                .ok_or_else(|| StorageError::Serialization("missing file_part_of_prompt".into()))?;
            Some(CardFile::from_persisted(&mime, data, part_of_prompt != 0).map_err(ser)?)
        }
    };

    Flashcard::from_persisted(
        flashcard_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("prompt").map_err(ser)?,
        row.try_get::<String, _>("response").map_err(ser)?,
        user_response_type,
        file,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_study_set_row(row: &SqliteRow) -> Result<StudySet, StorageError> {
    let cards_json: String = row.try_get("cards").map_err(ser)?;
    let cards: Vec<FlashcardId> = serde_json::from_str(&cards_json).map_err(ser)?;

    // Scores go back through `QuizScore::new` so a hand-edited row cannot smuggle in 1.5.
    let scores_json: String = row.try_get("quiz_scores").map_err(ser)?;
    let quiz_scores = serde_json::from_str::<Vec<f64>>(&scores_json)
        .map_err(ser)?
        .into_iter()
        .map(QuizScore::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ser)?;

    StudySet::from_persisted(
        study_set_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        cards,
        quiz_scores,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
