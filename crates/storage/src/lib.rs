#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    FlashcardRepository, InMemoryRepository, NewFlashcardRecord, NewStudySetRecord, Storage,
    StorageError, StudySetRepository,
};
