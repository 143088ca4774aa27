use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::file::CardFile;
use crate::model::ids::FlashcardId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlashcardError {
    #[error("flashcard prompt cannot be empty")]
    EmptyPrompt,

    #[error("flashcard response cannot be empty")]
    EmptyResponse,

    #[error("`{0}` is not a valid user response type (expected text, drawn or recorded)")]
    InvalidResponseType(String),
}

//
// ─── RESPONSE TYPE ─────────────────────────────────────────────────────────────
//

/// How the learner answers a card during a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Drawn,
    Recorded,
}

impl ResponseType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Drawn => "drawn",
            ResponseType::Recorded => "recorded",
        }
    }

    /// Only typed answers can be compared against the stored response.
    #[must_use]
    pub fn is_auto_gradable(self) -> bool {
        matches!(self, ResponseType::Text)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = FlashcardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ResponseType::Text),
            "drawn" => Ok(ResponseType::Drawn),
            "recorded" => Ok(ResponseType::Recorded),
            other => Err(FlashcardError::InvalidResponseType(other.to_owned())),
        }
    }
}

fn require_text(raw: String, err: FlashcardError) -> Result<String, FlashcardError> {
    if raw.trim().is_empty() {
        return Err(err);
    }
    Ok(raw)
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated flashcard fields as they arrive from a caller.
///
/// The response type is kept raw so an unknown value can be reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlashcardDraft {
    pub prompt: String,
    pub response: String,
    pub user_response_type: String,
}

impl FlashcardDraft {
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        response: impl Into<String>,
        user_response_type: ResponseType,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            user_response_type: user_response_type.as_str().to_owned(),
        }
    }

    /// Validate the draft into a card that is ready to be stored.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError` for a blank prompt or response, or an unknown
    /// response type.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedFlashcard, FlashcardError> {
        let prompt = require_text(self.prompt, FlashcardError::EmptyPrompt)?;
        let response = require_text(self.response, FlashcardError::EmptyResponse)?;
        let user_response_type = self.user_response_type.parse::<ResponseType>()?;

        Ok(ValidatedFlashcard {
            prompt,
            response,
            user_response_type,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFlashcard {
    pub prompt: String,
    pub response: String,
    pub user_response_type: ResponseType,
    pub created_at: DateTime<Utc>,
}

impl ValidatedFlashcard {
    #[must_use]
    pub fn assign_id(self, id: FlashcardId) -> Flashcard {
        Flashcard {
            id,
            prompt: self.prompt,
            response: self.response,
            user_response_type: self.user_response_type,
            file: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

//
// ─── PATCH ─────────────────────────────────────────────────────────────────────
//

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlashcardPatch {
    pub prompt: Option<String>,
    pub response: Option<String>,
    pub user_response_type: Option<String>,
}

impl FlashcardPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompt.is_none() && self.response.is_none() && self.user_response_type.is_none()
    }
}

impl From<FlashcardDraft> for FlashcardPatch {
    fn from(draft: FlashcardDraft) -> Self {
        Self {
            prompt: Some(draft.prompt),
            response: Some(draft.response),
            user_response_type: Some(draft.user_response_type),
        }
    }
}

//
// ─── FLASHCARD ─────────────────────────────────────────────────────────────────
//

/// A prompt/response pair with a declared answer modality and optional media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    id: FlashcardId,
    prompt: String,
    response: String,
    user_response_type: ResponseType,
    file: Option<CardFile>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Flashcard {
    /// Rehydrate a flashcard from storage.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError` if the stored text no longer validates.
    pub fn from_persisted(
        id: FlashcardId,
        prompt: String,
        response: String,
        user_response_type: ResponseType,
        file: Option<CardFile>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, FlashcardError> {
        Ok(Self {
            id,
            prompt: require_text(prompt, FlashcardError::EmptyPrompt)?,
            response: require_text(response, FlashcardError::EmptyResponse)?,
            user_response_type,
            file,
            created_at,
            updated_at,
        })
    }

    /// Merge a patch into a copy of this card and validate the whole result.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError` if the merged document is invalid.
    pub fn apply_patch(
        &self,
        patch: FlashcardPatch,
        now: DateTime<Utc>,
    ) -> Result<Self, FlashcardError> {
        let prompt = patch.prompt.unwrap_or_else(|| self.prompt.clone());
        let response = patch.response.unwrap_or_else(|| self.response.clone());
        let user_response_type = match patch.user_response_type {
            Some(raw) => raw.parse::<ResponseType>()?,
            None => self.user_response_type,
        };

        Ok(Self {
            id: self.id,
            prompt: require_text(prompt, FlashcardError::EmptyPrompt)?,
            response: require_text(response, FlashcardError::EmptyResponse)?,
            user_response_type,
            file: self.file.clone(),
            created_at: self.created_at,
            updated_at: now,
        })
    }

    /// Replace any existing attachment.
    #[must_use]
    pub fn with_file(mut self, file: CardFile, now: DateTime<Utc>) -> Self {
        self.file = Some(file);
        self.updated_at = now;
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> FlashcardId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    #[must_use]
    pub fn user_response_type(&self) -> ResponseType {
        self.user_response_type
    }

    #[must_use]
    pub fn file(&self) -> Option<&CardFile> {
        self.file.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileDraft;
    use crate::time::fixed_now;

    fn card() -> Flashcard {
        FlashcardDraft::new("Capital of France?", "Paris", ResponseType::Text)
            .validate(fixed_now())
            .unwrap()
            .assign_id(FlashcardId::new(1))
    }

    #[test]
    fn draft_validates_and_keeps_fields() {
        let card = card();
        assert_eq!(card.id(), FlashcardId::new(1));
        assert_eq!(card.prompt(), "Capital of France?");
        assert_eq!(card.response(), "Paris");
        assert_eq!(card.user_response_type(), ResponseType::Text);
        assert!(card.file().is_none());
    }

    #[test]
    fn draft_rejects_blank_prompt() {
        let err = FlashcardDraft::new("  ", "ok", ResponseType::Text)
            .validate(fixed_now())
            .unwrap_err();
        assert_eq!(err, FlashcardError::EmptyPrompt);
    }

    #[test]
    fn draft_rejects_missing_response() {
        let draft = FlashcardDraft {
            prompt: "Q".into(),
            user_response_type: "text".into(),
            ..FlashcardDraft::default()
        };
        assert_eq!(
            draft.validate(fixed_now()).unwrap_err(),
            FlashcardError::EmptyResponse
        );
    }

    #[test]
    fn draft_rejects_unknown_response_type() {
        let draft = FlashcardDraft {
            prompt: "Q".into(),
            response: "A".into(),
            user_response_type: "typed".into(),
        };
        assert_eq!(
            draft.validate(fixed_now()).unwrap_err(),
            FlashcardError::InvalidResponseType("typed".into())
        );
    }

    #[test]
    fn patch_revalidates_whole_document() {
        let card = card();
        let err = card
            .apply_patch(
                FlashcardPatch {
                    user_response_type: Some("sung".into()),
                    ..FlashcardPatch::default()
                },
                fixed_now(),
            )
            .unwrap_err();
        assert_eq!(err, FlashcardError::InvalidResponseType("sung".into()));

        let err = card
            .apply_patch(
                FlashcardPatch {
                    response: Some(String::new()),
                    ..FlashcardPatch::default()
                },
                fixed_now(),
            )
            .unwrap_err();
        assert_eq!(err, FlashcardError::EmptyResponse);
    }

    #[test]
    fn patch_keeps_untouched_fields_and_file() {
        let file = FileDraft {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
            part_of_prompt: Some(false),
        }
        .validate()
        .unwrap();
        let card = card().with_file(file.clone(), fixed_now());

        let later = fixed_now() + chrono::Duration::minutes(5);
        let updated = card
            .apply_patch(
                FlashcardPatch {
                    user_response_type: Some("drawn".into()),
                    ..FlashcardPatch::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(updated.prompt(), "Capital of France?");
        assert_eq!(updated.user_response_type(), ResponseType::Drawn);
        assert_eq!(updated.file(), Some(&file));
        assert_eq!(updated.created_at(), fixed_now());
        assert_eq!(updated.updated_at(), later);
    }

    #[test]
    fn response_type_round_trips_through_str() {
        for kind in [ResponseType::Text, ResponseType::Drawn, ResponseType::Recorded] {
            assert_eq!(kind.as_str().parse::<ResponseType>().unwrap(), kind);
        }
        assert!(ResponseType::Text.is_auto_gradable());
        assert!(!ResponseType::Recorded.is_auto_gradable());
    }
}
