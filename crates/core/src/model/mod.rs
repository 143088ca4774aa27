mod file;
mod flashcard;
mod ids;
mod study_set;

pub use file::{CardFile, FileDraft, MAX_FILE_BYTES, MediaFamily, MediaValidationError, MimeType};
pub use flashcard::{
    Flashcard, FlashcardDraft, FlashcardError, FlashcardPatch, ResponseType, ValidatedFlashcard,
};
pub use ids::{FlashcardId, MAX_ID, ParseIdError, StudySetId};
pub use study_set::{QuizScore, StudySet, StudySetError, validate_title};
