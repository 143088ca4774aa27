//! Staged editing of a study set's cards.
//!
//! Changes are kept in memory per card and only reach the stores on `save`,
//! which applies creates, then edits, then deletes.

use flashcards_core::model::{
    Flashcard, FlashcardDraft, FlashcardId, FlashcardPatch, StudySet, StudySetId,
};
use tracing::debug;

use crate::error::EditorError;
use crate::study_set_service::{CardRemoval, StudySetService};

/// Editing state of one card.
#[derive(Debug, Clone, PartialEq)]
pub enum StagedCard {
    Unchanged(Flashcard),
    Edited {
        original: Flashcard,
        draft: FlashcardDraft,
    },
    New {
        draft: FlashcardDraft,
    },
    /// Marked for deletion; `prior` is what `restore` brings back.
    Deleted {
        prior: Box<StagedCard>,
    },
}

impl StagedCard {
    /// The stored card behind this entry, if it has been persisted.
    #[must_use]
    pub fn stored(&self) -> Option<&Flashcard> {
        match self {
            StagedCard::Unchanged(card) | StagedCard::Edited { original: card, .. } => Some(card),
            StagedCard::New { .. } => None,
            StagedCard::Deleted { prior } => prior.stored(),
        }
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self, StagedCard::Deleted { .. })
    }
}

/// What one `save` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub created: Vec<FlashcardId>,
    pub edited: Vec<FlashcardId>,
    pub deleted: Vec<(FlashcardId, CardRemoval)>,
    /// New cards deleted before they were ever saved.
    pub dropped: usize,
}

/// In-memory editor over one study set.
#[derive(Debug, Clone)]
pub struct SetEditor {
    set: StudySet,
    loaded: Vec<Flashcard>,
    entries: Vec<StagedCard>,
}

impl SetEditor {
    /// Load a set and its cards into an editor with nothing staged.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::StudySet` if the set or its cards cannot be loaded.
    pub async fn load(
        service: &StudySetService,
        set_id: StudySetId,
    ) -> Result<Self, EditorError> {
        let set = service.get(set_id).await?;
        let loaded = service.cards_for_set(set_id).await?;
        let entries = loaded.iter().cloned().map(StagedCard::Unchanged).collect();
        Ok(Self {
            set,
            loaded,
            entries,
        })
    }

    #[must_use]
    pub fn set(&self) -> &StudySet {
        &self.set
    }

    #[must_use]
    pub fn entries(&self) -> &[StagedCard] {
        &self.entries
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.entries
            .iter()
            .any(|e| !matches!(e, StagedCard::Unchanged(_)))
            || self.entries.len() != self.loaded.len()
    }

    /// Stage a new card at the end. Returns its position.
    pub fn add(&mut self, draft: FlashcardDraft) -> usize {
        self.entries.push(StagedCard::New { draft });
        self.entries.len() - 1
    }

    /// Replace the staged content of a card.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NoSuchEntry` for a bad index and
    /// `EditorError::EditDeleted` for an entry marked deleted.
    pub fn edit(&mut self, index: usize, draft: FlashcardDraft) -> Result<(), EditorError> {
        let entry = self.entry_mut(index)?;
        let next = match take(entry) {
            StagedCard::Unchanged(original) | StagedCard::Edited { original, .. } => {
                StagedCard::Edited { original, draft }
            }
            StagedCard::New { .. } => StagedCard::New { draft },
            deleted @ StagedCard::Deleted { .. } => {
                *entry = deleted;
                return Err(EditorError::EditDeleted(index));
            }
        };
        *entry = next;
        Ok(())
    }

    /// Mark an entry deleted. Deleting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NoSuchEntry` for a bad index.
    pub fn delete(&mut self, index: usize) -> Result<(), EditorError> {
        let entry = self.entry_mut(index)?;
        if entry.is_deleted() {
            return Ok(());
        }
        let prior = take(entry);
        *entry = StagedCard::Deleted {
            prior: Box::new(prior),
        };
        Ok(())
    }

    /// Undo a staged delete.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::NotDeleted` if the entry is not marked deleted.
    pub fn restore(&mut self, index: usize) -> Result<(), EditorError> {
        let entry = self.entry_mut(index)?;
        match take(entry) {
            StagedCard::Deleted { prior } => {
                *entry = *prior;
                Ok(())
            }
            other => {
                *entry = other;
                Err(EditorError::NotDeleted(index))
            }
        }
    }

    /// Drop every staged change and return to the last loaded state.
    pub fn discard(&mut self) {
        self.entries = self.loaded.iter().cloned().map(StagedCard::Unchanged).collect();
    }

    /// Apply staged changes: creates, then edits, then deletes.
    ///
    /// Entries are settled as they succeed, so calling `save` again after an
    /// error only retries what is still pending.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::StudySet` from the first failing store call.
    pub async fn save(&mut self, service: &StudySetService) -> Result<SaveReport, EditorError> {
        let set_id = self.set.id();
        let mut report = SaveReport::default();

        for entry in &mut self.entries {
            if let StagedCard::New { draft } = entry {
                let linked = service.add_card(set_id, draft.clone()).await?;
                report.created.push(linked.card.id());
                *entry = StagedCard::Unchanged(linked.card);
            }
        }

        for entry in &mut self.entries {
            if let StagedCard::Edited { original, draft } = entry {
                let updated = service
                    .update_card(set_id, original.id(), FlashcardPatch::from(draft.clone()))
                    .await?;
                report.edited.push(updated.id());
                *entry = StagedCard::Unchanged(updated);
            }
        }

        let mut kept = Vec::with_capacity(self.entries.len());
        let mut pending = std::mem::take(&mut self.entries).into_iter();
        while let Some(entry) = pending.next() {
            let prior = match entry {
                StagedCard::Deleted { prior } => prior,
                other => {
                    kept.push(other);
                    continue;
                }
            };
            let Some(card_id) = prior.stored().map(Flashcard::id) else {
                report.dropped += 1;
                continue;
            };
            match service.remove_card(set_id, card_id).await {
                Ok(removed) => report.deleted.push((card_id, removed.outcome)),
                Err(err) => {
                    kept.push(StagedCard::Deleted { prior });
                    kept.extend(pending);
                    self.entries = kept;
                    return Err(err.into());
                }
            }
        }
        self.entries = kept;

        self.set = service.get(set_id).await?;
        self.loaded = self.entries.iter().filter_map(StagedCard::stored).cloned().collect();
        debug!(
            set_id = %set_id,
            created = report.created.len(),
            edited = report.edited.len(),
            deleted = report.deleted.len(),
            "saved staged edits"
        );
        Ok(report)
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut StagedCard, EditorError> {
        self.entries
            .get_mut(index)
            .ok_or(EditorError::NoSuchEntry(index))
    }
}

fn take(entry: &mut StagedCard) -> StagedCard {
    std::mem::replace(
        entry,
        StagedCard::New {
            draft: FlashcardDraft::default(),
        },
    )
}
