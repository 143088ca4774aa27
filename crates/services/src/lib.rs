#![forbid(unsafe_code)]

pub mod app_services;
pub mod editor;
pub mod error;
pub mod flashcard_service;
pub mod quiz_service;
pub mod reconcile;
pub mod study_set_service;

pub use flashcards_core::Clock;

pub use app_services::AppServices;
pub use editor::{SaveReport, SetEditor, StagedCard};
pub use error::{
    AppServicesError, EditorError, FlashcardServiceError, QuizServiceError, StudySetServiceError,
    SweepError,
};
pub use flashcard_service::FlashcardService;
pub use quiz_service::{Quiz, QuizService};
pub use reconcile::{OrphanSweep, SweepReport};
pub use study_set_service::{CardRemoval, CascadeReport, LinkedCard, RemovedCard, StudySetService};
