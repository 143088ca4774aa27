use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{FlashcardId, StudySetId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum StudySetError {
    #[error("study set title cannot be empty")]
    EmptyTitle,

    #[error("quiz score must be between 0 and 1, got {0}")]
    ScoreOutOfRange(f64),

    #[error("quiz score must be a finite number")]
    ScoreNotFinite,
}

/// Trim a title and reject it if nothing is left.
///
/// # Errors
///
/// Returns `StudySetError::EmptyTitle` for empty or whitespace-only input.
pub fn validate_title(raw: impl Into<String>) -> Result<String, StudySetError> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StudySetError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

//
// ─── QUIZ SCORE ────────────────────────────────────────────────────────────────
//

/// Fraction of a quiz answered correctly, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizScore(f64);

impl QuizScore {
    /// # Errors
    ///
    /// Returns `ScoreNotFinite` for NaN/infinity and `ScoreOutOfRange` outside `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, StudySetError> {
        if !value.is_finite() {
            return Err(StudySetError::ScoreNotFinite);
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(StudySetError::ScoreOutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

//
// ─── STUDY SET ─────────────────────────────────────────────────────────────────
//

/// A titled, ordered list of flashcard references plus quiz history.
///
/// Cards are referenced by id only; keeping those ids pointing at live
/// flashcards is the job of the services layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySet {
    id: StudySetId,
    title: String,
    cards: Vec<FlashcardId>,
    quiz_scores: Vec<QuizScore>,
    created_at: DateTime<Utc>,
}

impl StudySet {
    /// Creates an empty study set.
    ///
    /// # Errors
    ///
    /// Returns `StudySetError::EmptyTitle` if title is empty or whitespace-only.
    pub fn new(
        id: StudySetId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StudySetError> {
        Self::from_persisted(id, title, Vec::new(), Vec::new(), created_at)
    }

    /// Rehydrate a stored study set.
    ///
    /// # Errors
    ///
    /// Returns `StudySetError::EmptyTitle` if the stored title is blank.
    pub fn from_persisted(
        id: StudySetId,
        title: impl Into<String>,
        cards: Vec<FlashcardId>,
        quiz_scores: Vec<QuizScore>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, StudySetError> {
        Ok(Self {
            id,
            title: validate_title(title)?,
            cards,
            quiz_scores,
            created_at,
        })
    }

    /// # Errors
    ///
    /// Returns `StudySetError::EmptyTitle` if the new title is blank.
    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), StudySetError> {
        self.title = validate_title(title)?;
        Ok(())
    }

    /// Append a card reference at the end of the display order.
    pub fn link_card(&mut self, card_id: FlashcardId) {
        self.cards.push(card_id);
    }

    /// Drop every reference to `card_id`. Returns whether anything was removed.
    pub fn unlink_card(&mut self, card_id: FlashcardId) -> bool {
        let before = self.cards.len();
        self.cards.retain(|id| *id != card_id);
        self.cards.len() != before
    }

    #[must_use]
    pub fn contains_card(&self, card_id: FlashcardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn record_quiz_score(&mut self, score: QuizScore) {
        self.quiz_scores.push(score);
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> StudySetId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn cards(&self) -> &[FlashcardId] {
        &self.cards
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &[QuizScore] {
        &self.quiz_scores
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
