use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::flashcard_service::FlashcardService;
use crate::quiz_service::QuizService;
use crate::reconcile::OrphanSweep;
use crate::study_set_service::StudySetService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    flashcards: Arc<FlashcardService>,
    study_sets: Arc<StudySetService>,
    quiz: Arc<QuizService>,
    sweep: Arc<OrphanSweep>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let flashcards = FlashcardService::new(clock, Arc::clone(&storage.flashcards));
        let study_sets =
            StudySetService::new(clock, Arc::clone(&storage.sets), flashcards.clone());
        let quiz = QuizService::new(study_sets.clone());
        let sweep = OrphanSweep::new(Arc::clone(&storage.flashcards), Arc::clone(&storage.sets));

        Self {
            flashcards: Arc::new(flashcards),
            study_sets: Arc::new(study_sets),
            quiz: Arc::new(quiz),
            sweep: Arc::new(sweep),
        }
    }

    #[must_use]
    pub fn flashcards(&self) -> Arc<FlashcardService> {
        Arc::clone(&self.flashcards)
    }

    #[must_use]
    pub fn study_sets(&self) -> Arc<StudySetService> {
        Arc::clone(&self.study_sets)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn sweep(&self) -> Arc<OrphanSweep> {
        Arc::clone(&self.sweep)
    }
}
