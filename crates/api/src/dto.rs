//! Wire shapes. Field names follow the JSON the frontend already speaks.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flashcards_core::model::{
    Flashcard, FlashcardDraft, FlashcardId, FlashcardPatch, ResponseType, StudySet, StudySetId,
};
use serde::{Deserialize, Serialize};
use services::{CardRemoval, CascadeReport};

//
// ─── RESPONSES ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileJson {
    pub file_type: String,
    /// Base64 of the stored bytes.
    pub data: String,
    pub part_of_prompt: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardJson {
    #[serde(rename = "_id")]
    pub id: FlashcardId,
    pub prompt: String,
    pub response: String,
    pub user_response_type: ResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileJson>,
}

impl From<&Flashcard> for FlashcardJson {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id(),
            prompt: card.prompt().to_owned(),
            response: card.response().to_owned(),
            user_response_type: card.user_response_type(),
            file: card.file().map(|file| FileJson {
                file_type: file.mime().as_str().to_owned(),
                data: BASE64.encode(file.data()),
                part_of_prompt: file.part_of_prompt(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySetJson {
    #[serde(rename = "_id")]
    pub id: StudySetId,
    pub title: String,
    pub cards: Vec<FlashcardId>,
    pub quiz_scores: Vec<f64>,
}

impl From<&StudySet> for StudySetJson {
    fn from(set: &StudySet) -> Self {
        Self {
            id: set.id(),
            title: set.title().to_owned(),
            cards: set.cards().to_vec(),
            quiz_scores: set.quiz_scores().iter().map(|s| s.value()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudySetListJson {
    pub study_sets: Vec<StudySetJson>,
}

/// Set returned from add-card, with the card that was created.
#[derive(Debug, Serialize)]
pub struct LinkedCardJson {
    #[serde(flatten)]
    pub set: StudySetJson,
    pub card: FlashcardJson,
}

/// Set returned from remove-card, with what happened to the reference.
#[derive(Debug, Serialize)]
pub struct RemovedCardJson {
    #[serde(flatten)]
    pub set: StudySetJson,
    pub outcome: &'static str,
}

#[must_use]
pub fn removal_outcome(outcome: CardRemoval) -> &'static str {
    match outcome {
        CardRemoval::Removed => "removed",
        CardRemoval::PrunedStale => "pruned_stale",
        CardRemoval::NotInSet => "not_in_set",
    }
}

/// The deleted set as it was, with the cascade outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedSetJson {
    #[serde(flatten)]
    pub set: StudySetJson,
    pub deleted_cards: Vec<FlashcardId>,
    pub already_missing: Vec<FlashcardId>,
}

impl From<&CascadeReport> for DeletedSetJson {
    fn from(report: &CascadeReport) -> Self {
        Self {
            set: StudySetJson::from(&report.set),
            deleted_cards: report.deleted.clone(),
            already_missing: report.already_missing.clone(),
        }
    }
}

//
// ─── REQUESTS ──────────────────────────────────────────────────────────────────
//

/// Body of `POST /sets` and `PUT /sets/{id}`. A missing title is a blank title.
#[derive(Debug, Deserialize)]
pub struct TitleBody {
    #[serde(default)]
    pub title: String,
}

/// A full flashcard; missing fields fail validation rather than parsing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub user_response_type: String,
}

impl From<FlashcardBody> for FlashcardDraft {
    fn from(body: FlashcardBody) -> Self {
        FlashcardDraft {
            prompt: body.prompt,
            response: body.response,
            user_response_type: body.user_response_type,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardPatchBody {
    pub prompt: Option<String>,
    pub response: Option<String>,
    pub user_response_type: Option<String>,
}

impl From<FlashcardPatchBody> for FlashcardPatch {
    fn from(body: FlashcardPatchBody) -> Self {
        FlashcardPatch {
            prompt: body.prompt,
            response: body.response,
            user_response_type: body.user_response_type,
        }
    }
}

/// Body of `POST /sets/{id}/quiz`. Kept loose so a non-number is a
/// validation error, not a parse error.
#[derive(Debug, Deserialize)]
pub struct QuizScoreBody {
    #[serde(rename = "addedQuizScore", default)]
    pub added_quiz_score: Option<serde_json::Value>,
}

impl QuizScoreBody {
    #[must_use]
    pub fn as_fraction(&self) -> Option<f64> {
        self.added_quiz_score.as_ref().and_then(serde_json::Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashcards_core::model::FileDraft;
    use flashcards_core::time::fixed_now;
    use serde_json::json;

    #[test]
    fn flashcard_json_uses_wire_names() {
        let file = FileDraft {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
            part_of_prompt: Some(true),
        }
        .validate()
        .unwrap();
        let card = FlashcardDraft::new("Q", "A", ResponseType::Drawn)
            .validate(fixed_now())
            .unwrap()
            .assign_id(FlashcardId::new(7))
            .with_file(file, fixed_now());

        let value = serde_json::to_value(FlashcardJson::from(&card)).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": 7,
                "prompt": "Q",
                "response": "A",
                "userResponseType": "drawn",
                "file": {"fileType": "image/png", "data": "AQID", "partOfPrompt": true}
            })
        );
    }

    #[test]
    fn quiz_score_body_accepts_numbers_only() {
        let body: QuizScoreBody = serde_json::from_value(json!({"addedQuizScore": 0.25})).unwrap();
        assert_eq!(body.as_fraction(), Some(0.25));
        let body: QuizScoreBody = serde_json::from_value(json!({"addedQuizScore": "0.25"})).unwrap();
        assert_eq!(body.as_fraction(), None);
        let body: QuizScoreBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.as_fraction(), None);
    }
}
