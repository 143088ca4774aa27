//! Optional cleanup for what the non-transactional protocol can leave behind.
//!
//! Orphans are flashcards no set references. Dangling references are set
//! entries whose flashcard is gone. Neither is touched by normal requests;
//! run the sweep while nothing else is writing.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use flashcards_core::model::{FlashcardId, StudySetId};
use storage::repository::{FlashcardRepository, StorageError, StudySetRepository};
use tracing::{info, warn};

use crate::error::SweepError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub orphans: Vec<FlashcardId>,
    pub dangling: Vec<(StudySetId, FlashcardId)>,
}

impl SweepReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.dangling.is_empty()
    }
}

#[derive(Clone)]
pub struct OrphanSweep {
    flashcards: Arc<dyn FlashcardRepository>,
    sets: Arc<dyn StudySetRepository>,
}

impl OrphanSweep {
    #[must_use]
    pub fn new(flashcards: Arc<dyn FlashcardRepository>, sets: Arc<dyn StudySetRepository>) -> Self {
        Self { flashcards, sets }
    }

    /// Report orphans and dangling references without changing anything.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Storage` if either store cannot be listed.
    pub async fn scan(&self) -> Result<SweepReport, SweepError> {
        let stored: BTreeSet<FlashcardId> =
            self.flashcards.list_flashcard_ids().await?.into_iter().collect();
        let sets = self.sets.list_sets().await?;

        let mut referenced = HashSet::new();
        let mut dangling = Vec::new();
        for set in &sets {
            for &card_id in set.cards() {
                referenced.insert(card_id);
                let entry = (set.id(), card_id);
                if !stored.contains(&card_id) && !dangling.contains(&entry) {
                    dangling.push(entry);
                }
            }
        }

        let orphans = stored
            .into_iter()
            .filter(|id| !referenced.contains(id))
            .collect();
        Ok(SweepReport { orphans, dangling })
    }

    /// Delete orphans and prune dangling references, returning what was found.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Storage` on the first store failure; earlier
    /// fixes stay applied.
    pub async fn run(&self) -> Result<SweepReport, SweepError> {
        let report = self.scan().await?;
        if report.is_clean() {
            info!("orphan sweep found nothing to fix");
            return Ok(report);
        }

        for &card_id in &report.orphans {
            match self.flashcards.delete_flashcard(card_id).await {
                Ok(()) | Err(StorageError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
        }

        for &(set_id, card_id) in &report.dangling {
            match self.sets.unlink_card(set_id, card_id).await {
                Ok(_) | Err(StorageError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
        }

        warn!(
            orphans = report.orphans.len(),
            dangling = report.dangling.len(),
            "orphan sweep repaired stores"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashcards_core::model::{FlashcardDraft, ResponseType};
    use flashcards_core::time::fixed_now;
    use storage::repository::{NewFlashcardRecord, NewStudySetRecord};
    use storage::InMemoryRepository;

    async fn card(repo: &InMemoryRepository, prompt: &str) -> FlashcardId {
        let validated = FlashcardDraft::new(prompt, "A", ResponseType::Text)
            .validate(fixed_now())
            .unwrap();
        repo.insert_new_flashcard(NewFlashcardRecord::from_validated(validated))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn finds_and_fixes_orphans_and_dangling_ids() {
        let repo = InMemoryRepository::new();
        let linked = card(&repo, "linked").await;
        let orphan = card(&repo, "orphan").await;
        let gone = card(&repo, "gone").await;

        let set_id = repo
            .insert_new_set(NewStudySetRecord {
                title: "Capitals".into(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        repo.link_card(set_id, linked).await.unwrap();
        repo.link_card(set_id, gone).await.unwrap();
        repo.delete_flashcard(gone).await.unwrap();

        let sweep = OrphanSweep::new(Arc::new(repo.clone()), Arc::new(repo.clone()));
        let report = sweep.scan().await.unwrap();
        assert_eq!(report.orphans, vec![orphan]);
        assert_eq!(report.dangling, vec![(set_id, gone)]);

        sweep.run().await.unwrap();
        assert_eq!(repo.list_flashcard_ids().await.unwrap(), vec![linked]);
        assert_eq!(repo.get_set(set_id).await.unwrap().unwrap().cards(), &[linked]);
        assert!(sweep.scan().await.unwrap().is_clean());
    }
}
