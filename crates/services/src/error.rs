//! Shared error types for the services crate.

use thiserror::Error;

use flashcards_core::model::{
    FlashcardError, FlashcardId, MediaValidationError, StudySetError, StudySetId,
};
use flashcards_core::quiz::QuizError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `FlashcardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlashcardServiceError {
    #[error(transparent)]
    Flashcard(#[from] FlashcardError),
    #[error(transparent)]
    Media(#[from] MediaValidationError),
    #[error("flashcard {0} does not exist")]
    NotFound(FlashcardId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudySetService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudySetServiceError {
    #[error(transparent)]
    StudySet(#[from] StudySetError),
    #[error("study set {0} does not exist")]
    SetNotFound(StudySetId),
    #[error(transparent)]
    Flashcard(#[from] FlashcardServiceError),
    #[error("study set {set_id} references missing flashcard {card_id}")]
    DanglingReference {
        set_id: StudySetId,
        card_id: FlashcardId,
    },
    /// The set document was deleted but some of its flashcards were not.
    #[error("deleted study set {set_id} but {} of {total} flashcards could not be deleted", .failed.len())]
    PartialCascade {
        set_id: StudySetId,
        failed: Vec<FlashcardId>,
        total: usize,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    StudySet(#[from] StudySetServiceError),
}

/// Errors emitted by `SetEditor`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EditorError {
    #[error("no staged card at position {0}")]
    NoSuchEntry(usize),
    #[error("staged card {0} is deleted; restore it before editing")]
    EditDeleted(usize),
    #[error("staged card {0} is not deleted")]
    NotDeleted(usize),
    #[error(transparent)]
    StudySet(#[from] StudySetServiceError),
}

/// Errors emitted by `OrphanSweep`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SweepError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
