//! Quiz grading.
//!
//! Responses are paired by position with the set's cards. Typed answers are
//! graded automatically; drawn and recorded answers stay `Unknown` until the
//! learner overrides them, and a score can only be produced once every item
//! has a definite verdict.

use thiserror::Error;

use crate::model::{Flashcard, FlashcardId, ResponseType};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("expected {expected} responses, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("response {index} answers card {actual}, expected card {expected}")]
    CardMismatch {
        index: usize,
        expected: FlashcardId,
        actual: FlashcardId,
    },

    #[error("response {index} is a {actual} answer but the card expects {expected}")]
    TypeMismatch {
        index: usize,
        expected: ResponseType,
        actual: ResponseType,
    },

    #[error("response {index} is empty")]
    BlankText { index: usize },

    #[error("{count} responses still need a manual verdict")]
    Unresolved { count: usize },

    #[error("no quiz item at position {0}")]
    NoSuchItem(usize),

    #[error("cannot score a quiz with no items")]
    Empty,
}

//
// ─── RESPONSES ─────────────────────────────────────────────────────────────────
//

/// Opaque handle to a drawing or recording captured by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef(String);

impl MediaRef {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseData {
    Text(String),
    Drawn(MediaRef),
    Recorded(MediaRef),
}

impl ResponseData {
    #[must_use]
    pub fn response_type(&self) -> ResponseType {
        match self {
            ResponseData::Text(_) => ResponseType::Text,
            ResponseData::Drawn(_) => ResponseType::Drawn,
            ResponseData::Recorded(_) => ResponseType::Recorded,
        }
    }
}

/// One learner answer. Never persisted; it only feeds grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResponse {
    pub card_id: FlashcardId,
    pub answer: ResponseData,
}

impl QuizResponse {
    #[must_use]
    pub fn text(card_id: FlashcardId, answer: impl Into<String>) -> Self {
        Self {
            card_id,
            answer: ResponseData::Text(answer.into()),
        }
    }
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    Unknown,
}

impl Verdict {
    fn from_bool(correct: bool) -> Self {
        if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedItem {
    pub card_id: FlashcardId,
    pub response_type: ResponseType,
    pub verdict: Verdict,
    pub overridden: bool,
}

/// Compare a typed answer with the stored response.
///
/// The learner's answer is trimmed; both sides compare case-insensitively.
#[must_use]
pub fn grade_text(expected: &str, given: &str) -> bool {
    given.trim().to_lowercase() == expected.to_lowercase()
}

/// Check that responses line up with cards before grading or submitting.
///
/// # Errors
///
/// Returns `QuizError` on a count, card or type mismatch, or a blank typed answer.
pub fn validate_responses(cards: &[Flashcard], responses: &[QuizResponse]) -> Result<(), QuizError> {
    if cards.len() != responses.len() {
        return Err(QuizError::CountMismatch {
            expected: cards.len(),
            actual: responses.len(),
        });
    }

    for (index, (card, response)) in cards.iter().zip(responses).enumerate() {
        if card.id() != response.card_id {
            return Err(QuizError::CardMismatch {
                index,
                expected: card.id(),
                actual: response.card_id,
            });
        }

        let actual = response.answer.response_type();
        if actual != card.user_response_type() {
            return Err(QuizError::TypeMismatch {
                index,
                expected: card.user_response_type(),
                actual,
            });
        }

        if let ResponseData::Text(text) = &response.answer {
            if text.trim().is_empty() {
                return Err(QuizError::BlankText { index });
            }
        }
    }

    Ok(())
}

/// Outcome of grading one quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedQuiz {
    items: Vec<GradedItem>,
}

impl GradedQuiz {
    /// Validate and grade `responses` against `cards`, position by position.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if `validate_responses` rejects the input.
    pub fn grade(cards: &[Flashcard], responses: &[QuizResponse]) -> Result<Self, QuizError> {
        validate_responses(cards, responses)?;

        let items = cards
            .iter()
            .zip(responses)
            .map(|(card, response)| {
                let verdict = match &response.answer {
                    ResponseData::Text(given) => {
                        Verdict::from_bool(grade_text(card.response(), given))
                    }
                    ResponseData::Drawn(_) | ResponseData::Recorded(_) => Verdict::Unknown,
                };
                GradedItem {
                    card_id: card.id(),
                    response_type: card.user_response_type(),
                    verdict,
                    overridden: false,
                }
            })
            .collect();

        Ok(Self { items })
    }

    /// Force a verdict for one item; this is how `Unknown` items get resolved.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSuchItem` if `index` is out of range.
    pub fn override_verdict(&mut self, index: usize, correct: bool) -> Result<(), QuizError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(QuizError::NoSuchItem(index))?;
        item.verdict = Verdict::from_bool(correct);
        item.overridden = true;
        Ok(())
    }

    #[must_use]
    pub fn items(&self) -> &[GradedItem] {
        &self.items
    }

    #[must_use]
    pub fn unresolved(&self) -> usize {
        self.count(Verdict::Unknown)
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.count(Verdict::Correct)
    }

    fn count(&self, verdict: Verdict) -> usize {
        self.items.iter().filter(|i| i.verdict == verdict).count()
    }

    /// Fraction of items marked correct.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Unresolved` while any item is `Unknown`, or
    /// `QuizError::Empty` for a quiz without items.
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction_correct(&self) -> Result<f64, QuizError> {
        if self.items.is_empty() {
            return Err(QuizError::Empty);
        }
        let unresolved = self.unresolved();
        if unresolved > 0 {
            return Err(QuizError::Unresolved { count: unresolved });
        }
        Ok(self.correct() as f64 / self.items.len() as f64)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
