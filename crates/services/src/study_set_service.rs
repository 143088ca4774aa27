//! Study set operations and the protocol that keeps a set's card references
//! consistent with the independently stored flashcards.
//!
//! Nothing here is transactional. Steps are ordered so that a failure part way
//! through leaves an orphan flashcard rather than a set pointing at a card that
//! does not exist.

use std::sync::Arc;

use flashcards_core::model::{
    Flashcard, FlashcardDraft, FlashcardId, FlashcardPatch, QuizScore, StudySet, StudySetId,
    validate_title,
};
use storage::repository::{NewStudySetRecord, StorageError, StudySetRepository};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::{FlashcardServiceError, StudySetServiceError};
use crate::flashcard_service::FlashcardService;

/// What `remove_card` did with the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRemoval {
    /// The flashcard was deleted and its id unlinked.
    Removed,
    /// The flashcard was already gone; the stale id was pruned from the set.
    PrunedStale,
    /// The set never referenced this id. Nothing was touched.
    NotInSet,
}

/// Result of removing a card reference from a set.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedCard {
    pub set: StudySet,
    pub outcome: CardRemoval,
}

/// Result of adding a new card to a set.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedCard {
    pub set: StudySet,
    pub card: Flashcard,
}

/// Outcome of a fully successful cascade delete.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeReport {
    /// The set as it was before deletion.
    pub set: StudySet,
    pub deleted: Vec<FlashcardId>,
    /// Referenced ids whose flashcard was already gone.
    pub already_missing: Vec<FlashcardId>,
}

/// Orchestrates study sets and their flashcards.
#[derive(Clone)]
pub struct StudySetService {
    clock: Clock,
    sets: Arc<dyn StudySetRepository>,
    flashcards: FlashcardService,
}

impl StudySetService {
    #[must_use]
    pub fn new(clock: Clock, sets: Arc<dyn StudySetRepository>, flashcards: FlashcardService) -> Self {
        Self {
            clock,
            sets,
            flashcards,
        }
    }

    /// # Errors
    ///
    /// Returns `StudySetServiceError::Storage` if sets cannot be loaded.
    pub async fn list(&self) -> Result<Vec<StudySet>, StudySetServiceError> {
        Ok(self.sets.list_sets().await?)
    }

    /// Create an empty study set.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::StudySet` for a blank title.
    pub async fn create(&self, title: impl Into<String>) -> Result<StudySet, StudySetServiceError> {
        let title = validate_title(title)?;
        let created_at = self.clock.now();
        let id = self
            .sets
            .insert_new_set(NewStudySetRecord {
                title: title.clone(),
                created_at,
            })
            .await?;
        info!(set_id = %id, "created study set");
        Ok(StudySet::new(id, title, created_at)?)
    }

    /// # Errors
    ///
    /// Returns `StudySetServiceError::SetNotFound` if no set has this id.
    pub async fn get(&self, id: StudySetId) -> Result<StudySet, StudySetServiceError> {
        self.sets
            .get_set(id)
            .await?
            .ok_or(StudySetServiceError::SetNotFound(id))
    }

    /// Flashcards of a set in display order.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::SetNotFound` for a missing set and
    /// `StudySetServiceError::DanglingReference` if a referenced card is gone.
    pub async fn cards_for_set(&self, id: StudySetId) -> Result<Vec<Flashcard>, StudySetServiceError> {
        let set = self.get(id).await?;
        self.flashcards
            .get_many(set.cards())
            .await
            .map_err(|e| match e {
                FlashcardServiceError::NotFound(card_id) => {
                    warn!(set_id = %id, card_id = %card_id, "study set references a missing flashcard");
                    StudySetServiceError::DanglingReference {
                        set_id: id,
                        card_id,
                    }
                }
                other => StudySetServiceError::Flashcard(other),
            })
    }

    /// # Errors
    ///
    /// Returns `StudySetServiceError::StudySet` for a blank title and
    /// `StudySetServiceError::SetNotFound` for a missing set.
    pub async fn rename(
        &self,
        id: StudySetId,
        title: impl Into<String>,
    ) -> Result<StudySet, StudySetServiceError> {
        let title = validate_title(title)?;
        self.sets
            .rename_set(id, &title)
            .await
            .map_err(set_storage_error(id))
    }

    /// Delete every referenced flashcard, then the set itself.
    ///
    /// Individual card failures do not stop the cascade. Cards that were
    /// already missing count as deleted.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::PartialCascade` when the set was deleted
    /// but some cards were not; already deleted cards stay deleted.
    pub async fn delete(&self, id: StudySetId) -> Result<CascadeReport, StudySetServiceError> {
        let set = self.get(id).await?;
        let total = set.cards().len();

        let mut deleted = Vec::new();
        let mut already_missing = Vec::new();
        let mut failed = Vec::new();
        for &card_id in set.cards() {
            match self.flashcards.delete(card_id).await {
                Ok(()) => deleted.push(card_id),
                Err(FlashcardServiceError::NotFound(_)) => already_missing.push(card_id),
                Err(err) => {
                    warn!(set_id = %id, card_id = %card_id, error = %err, "cascade delete failed for flashcard");
                    failed.push(card_id);
                }
            }
        }

        self.sets.delete_set(id).await.map_err(set_storage_error(id))?;

        if !failed.is_empty() {
            warn!(set_id = %id, failed = failed.len(), total, "study set deleted with leftover flashcards");
            return Err(StudySetServiceError::PartialCascade {
                set_id: id,
                failed,
                total,
            });
        }

        info!(set_id = %id, deleted = deleted.len(), "deleted study set");
        Ok(CascadeReport {
            set,
            deleted,
            already_missing,
        })
    }

    /// Create a flashcard and append it to the set.
    ///
    /// The set must exist before anything is created, and the card must be
    /// stored before its id is linked.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::SetNotFound` without creating anything,
    /// or `StudySetServiceError::Flashcard` if the card is rejected.
    pub async fn add_card(
        &self,
        set_id: StudySetId,
        draft: FlashcardDraft,
    ) -> Result<LinkedCard, StudySetServiceError> {
        self.get(set_id).await?;
        let card = self.flashcards.create(draft).await?;

        let set = match self.sets.link_card(set_id, card.id()).await {
            Ok(set) => set,
            Err(err) => {
                warn!(set_id = %set_id, card_id = %card.id(), error = %err, "card created but not linked");
                return Err(set_storage_error(set_id)(err));
            }
        };
        debug!(set_id = %set_id, card_id = %card.id(), "linked card into study set");
        Ok(LinkedCard { set, card })
    }

    /// Delete a flashcard and unlink it from the set.
    ///
    /// A card that is already gone is pruned from the set and reported as
    /// `CardRemoval::PrunedStale`. An id the set does not reference leaves
    /// both stores untouched.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::SetNotFound` for a missing set. Other
    /// flashcard delete failures leave the set unchanged.
    pub async fn remove_card(
        &self,
        set_id: StudySetId,
        card_id: FlashcardId,
    ) -> Result<RemovedCard, StudySetServiceError> {
        let set = self.get(set_id).await?;
        if !set.contains_card(card_id) {
            debug!(set_id = %set_id, card_id = %card_id, "card not referenced by set");
            return Ok(RemovedCard {
                set,
                outcome: CardRemoval::NotInSet,
            });
        }

        let outcome = match self.flashcards.delete(card_id).await {
            Ok(()) => CardRemoval::Removed,
            Err(FlashcardServiceError::NotFound(_)) => {
                warn!(set_id = %set_id, card_id = %card_id, "pruning stale card reference");
                CardRemoval::PrunedStale
            }
            Err(err) => return Err(err.into()),
        };

        let set = self
            .sets
            .unlink_card(set_id, card_id)
            .await
            .map_err(set_storage_error(set_id))?;
        Ok(RemovedCard { set, outcome })
    }

    /// Delete a flashcard and drop it from every set that references it.
    ///
    /// References are dropped first, so a failed delete leaves an orphan card
    /// and never a set pointing at nothing.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Flashcard` if the card does not exist
    /// or cannot be deleted.
    pub async fn delete_card(&self, card_id: FlashcardId) -> Result<Flashcard, StudySetServiceError> {
        let card = self.flashcards.get(card_id).await?;
        for set in self.sets.list_sets().await? {
            if !set.contains_card(card_id) {
                continue;
            }
            match self.sets.unlink_card(set.id(), card_id).await {
                Ok(_) | Err(StorageError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
            warn!(set_id = %set.id(), card_id = %card_id, "unlinked flashcard deleted outside its set");
        }

        self.flashcards.delete(card_id).await?;
        info!(card_id = %card_id, "deleted flashcard");
        Ok(card)
    }

    /// Update a card through its set. The set is only checked for existence.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::SetNotFound` for a missing set or
    /// `StudySetServiceError::Flashcard` from the card update.
    pub async fn update_card(
        &self,
        set_id: StudySetId,
        card_id: FlashcardId,
        patch: FlashcardPatch,
    ) -> Result<Flashcard, StudySetServiceError> {
        self.get(set_id).await?;
        Ok(self.flashcards.update(card_id, patch).await?)
    }

    /// Append a quiz result to the set's score history.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::StudySet` for a fraction outside `[0, 1]`
    /// or a non-finite value.
    pub async fn record_quiz_score(
        &self,
        set_id: StudySetId,
        fraction: f64,
    ) -> Result<StudySet, StudySetServiceError> {
        let score = QuizScore::new(fraction)?;
        let set = self
            .sets
            .append_quiz_score(set_id, score)
            .await
            .map_err(set_storage_error(set_id))?;
        debug!(set_id = %set_id, fraction, "recorded quiz score");
        Ok(set)
    }
}

fn set_storage_error(id: StudySetId) -> impl FnOnce(StorageError) -> StudySetServiceError {
    move |e| match e {
        StorageError::NotFound => StudySetServiceError::SetNotFound(id),
        other => StudySetServiceError::Storage(other),
    }
}
