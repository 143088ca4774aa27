use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashcards_core::model::{
    Flashcard, FlashcardId, QuizScore, ResponseType, StudySet, StudySetId, ValidatedFlashcard,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a flashcard; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewFlashcardRecord {
    pub prompt: String,
    pub response: String,
    pub user_response_type: ResponseType,
    pub created_at: DateTime<Utc>,
}

impl NewFlashcardRecord {
    #[must_use]
    pub fn from_validated(card: ValidatedFlashcard) -> Self {
        Self {
            prompt: card.prompt,
            response: card.response,
            user_response_type: card.user_response_type,
            created_at: card.created_at,
        }
    }
}

/// Insert shape for a study set; it always starts with no cards or scores.
#[derive(Debug, Clone)]
pub struct NewStudySetRecord {
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Repository contract for flashcard documents.
#[async_trait]
pub trait FlashcardRepository: Send + Sync {
    /// Insert a new flashcard and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the card cannot be stored.
    async fn insert_new_flashcard(
        &self,
        card: NewFlashcardRecord,
    ) -> Result<FlashcardId, StorageError>;

    /// Fetch a flashcard by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_flashcard(&self, id: FlashcardId) -> Result<Option<Flashcard>, StorageError>;

    /// Fetch flashcards in the order of `ids`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if any are missing, or other storage errors.
    async fn get_flashcards(&self, ids: &[FlashcardId]) -> Result<Vec<Flashcard>, StorageError>;

    /// Overwrite an existing flashcard, including its attachment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no card has this id.
    async fn update_flashcard(&self, card: &Flashcard) -> Result<(), StorageError>;

    /// Delete a flashcard.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no card has this id.
    async fn delete_flashcard(&self, id: FlashcardId) -> Result<(), StorageError>;

    /// Every stored flashcard id, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures.
    async fn list_flashcard_ids(&self) -> Result<Vec<FlashcardId>, StorageError>;
}

/// Repository contract for study set documents.
#[async_trait]
pub trait StudySetRepository: Send + Sync {
    /// Insert a new, empty study set and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn insert_new_set(&self, set: NewStudySetRecord) -> Result<StudySetId, StorageError>;

    /// Fetch a study set by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_set(&self, id: StudySetId) -> Result<Option<StudySet>, StorageError>;

    /// All study sets ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_sets(&self) -> Result<Vec<StudySet>, StorageError>;

    /// Replace the title of an existing set. Cards and scores are not touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no set has this id.
    async fn rename_set(&self, id: StudySetId, title: &str) -> Result<StudySet, StorageError>;

    /// Append `card_id` to the set's card list in one step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no set has this id.
    async fn link_card(
        &self,
        id: StudySetId,
        card_id: FlashcardId,
    ) -> Result<StudySet, StorageError>;

    /// Drop every reference to `card_id` from the set in one step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no set has this id.
    async fn unlink_card(
        &self,
        id: StudySetId,
        card_id: FlashcardId,
    ) -> Result<StudySet, StorageError>;

    /// Append a score to the set's quiz history in one step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no set has this id.
    async fn append_quiz_score(
        &self,
        id: StudySetId,
        score: QuizScore,
    ) -> Result<StudySet, StorageError>;

    /// Delete a study set document. Does not touch flashcards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no set has this id.
    async fn delete_set(&self, id: StudySetId) -> Result<(), StorageError>;
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Ids come from one counter shared by both collections and are never reused.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    flashcards: Arc<Mutex<BTreeMap<FlashcardId, Flashcard>>>,
    sets: Arc<Mutex<BTreeMap<StudySetId, StudySet>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of stored flashcards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn flashcard_count(&self) -> Result<usize, StorageError> {
        Ok(self.flashcards.lock().map_err(poisoned)?.len())
    }

    /// Apply `change` to a stored set while holding the lock.
    fn modify_set(
        &self,
        id: StudySetId,
        change: impl FnOnce(&mut StudySet) -> Result<(), StorageError>,
    ) -> Result<StudySet, StorageError> {
        let mut guard = self.sets.lock().map_err(poisoned)?;
        let slot = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        change(slot)?;
        Ok(slot.clone())
    }
}

#[async_trait]
impl FlashcardRepository for InMemoryRepository {
    async fn insert_new_flashcard(
        &self,
        card: NewFlashcardRecord,
    ) -> Result<FlashcardId, StorageError> {
        let id = FlashcardId::new(self.allocate_id());
        let flashcard = Flashcard::from_persisted(
            id,
            card.prompt,
            card.response,
            card.user_response_type,
            None,
            card.created_at,
            card.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self.flashcards.lock().map_err(poisoned)?;
        guard.insert(id, flashcard);
        Ok(id)
    }

    async fn get_flashcard(&self, id: FlashcardId) -> Result<Option<Flashcard>, StorageError> {
        let guard = self.flashcards.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn get_flashcards(&self, ids: &[FlashcardId]) -> Result<Vec<Flashcard>, StorageError> {
        let guard = self.flashcards.lock().map_err(poisoned)?;
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            match guard.get(id) {
                Some(card) => found.push(card.clone()),
                None => return Err(StorageError::NotFound),
            }
        }
        Ok(found)
    }

    async fn update_flashcard(&self, card: &Flashcard) -> Result<(), StorageError> {
        let mut guard = self.flashcards.lock().map_err(poisoned)?;
        match guard.get_mut(&card.id()) {
            Some(slot) => {
                *slot = card.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_flashcard(&self, id: FlashcardId) -> Result<(), StorageError> {
        let mut guard = self.flashcards.lock().map_err(poisoned)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }

    async fn list_flashcard_ids(&self) -> Result<Vec<FlashcardId>, StorageError> {
        let guard = self.flashcards.lock().map_err(poisoned)?;
        Ok(guard.keys().copied().collect())
    }
}

#[async_trait]
impl StudySetRepository for InMemoryRepository {
    async fn insert_new_set(&self, set: NewStudySetRecord) -> Result<StudySetId, StorageError> {
        let id = StudySetId::new(self.allocate_id());
        let study_set = StudySet::new(id, set.title, set.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self.sets.lock().map_err(poisoned)?;
        guard.insert(id, study_set);
        Ok(id)
    }

    async fn get_set(&self, id: StudySetId) -> Result<Option<StudySet>, StorageError> {
        let guard = self.sets.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_sets(&self) -> Result<Vec<StudySet>, StorageError> {
        let guard = self.sets.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn rename_set(&self, id: StudySetId, title: &str) -> Result<StudySet, StorageError> {
        self.modify_set(id, |set| {
            set.rename(title)
                .map_err(|e| StorageError::Serialization(e.to_string()))
        })
    }

    async fn link_card(
        &self,
        id: StudySetId,
        card_id: FlashcardId,
    ) -> Result<StudySet, StorageError> {
        self.modify_set(id, |set| {
            set.link_card(card_id);
            Ok(())
        })
    }

    async fn unlink_card(
        &self,
        id: StudySetId,
        card_id: FlashcardId,
    ) -> Result<StudySet, StorageError> {
        self.modify_set(id, |set| {
            set.unlink_card(card_id);
            Ok(())
        })
    }

    async fn append_quiz_score(
        &self,
        id: StudySetId,
        score: QuizScore,
    ) -> Result<StudySet, StorageError> {
        self.modify_set(id, |set| {
            set.record_quiz_score(score);
            Ok(())
        })
    }

    async fn delete_set(&self, id: StudySetId) -> Result<(), StorageError> {
        let mut guard = self.sets.lock().map_err(poisoned)?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

/// Aggregates the two document stores behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub flashcards: Arc<dyn FlashcardRepository>,
    pub sets: Arc<dyn StudySetRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository so tests can keep a handle to it.
    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let flashcards: Arc<dyn FlashcardRepository> = Arc::new(repo.clone());
        let sets: Arc<dyn StudySetRepository> = Arc::new(repo);
        Self { flashcards, sets }
    }
}
