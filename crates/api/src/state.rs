use std::sync::Arc;

use services::{AppServices, FlashcardService, StudySetService};

/// Shared handler state; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub flashcards: Arc<FlashcardService>,
    pub study_sets: Arc<StudySetService>,
}

impl AppState {
    #[must_use]
    pub fn new(services: &AppServices) -> Self {
        Self {
            flashcards: services.flashcards(),
            study_sets: services.study_sets(),
        }
    }
}
