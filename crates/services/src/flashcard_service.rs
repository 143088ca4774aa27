use std::sync::Arc;

use flashcards_core::model::{FileDraft, Flashcard, FlashcardDraft, FlashcardId, FlashcardPatch};
use storage::repository::{FlashcardRepository, NewFlashcardRecord, StorageError};
use tracing::debug;

use crate::Clock;
use crate::error::FlashcardServiceError;

/// Create, read, update and delete standalone flashcard documents.
#[derive(Clone)]
pub struct FlashcardService {
    clock: Clock,
    flashcards: Arc<dyn FlashcardRepository>,
}

impl FlashcardService {
    #[must_use]
    pub fn new(clock: Clock, flashcards: Arc<dyn FlashcardRepository>) -> Self {
        Self { clock, flashcards }
    }

    /// Validate and persist a new flashcard.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardServiceError::Flashcard` for validation failures.
    /// Returns `FlashcardServiceError::Storage` if persistence fails.
    pub async fn create(&self, draft: FlashcardDraft) -> Result<Flashcard, FlashcardServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self
            .flashcards
            .insert_new_flashcard(NewFlashcardRecord::from_validated(validated.clone()))
            .await?;
        debug!(card_id = %id, "created flashcard");
        Ok(validated.assign_id(id))
    }

    /// # Errors
    ///
    /// Returns `FlashcardServiceError::NotFound` if no card has this id.
    pub async fn get(&self, id: FlashcardId) -> Result<Flashcard, FlashcardServiceError> {
        self.flashcards
            .get_flashcard(id)
            .await?
            .ok_or(FlashcardServiceError::NotFound(id))
    }

    /// Fetch several cards in the order given.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardServiceError::NotFound` naming the first missing id.
    pub async fn get_many(
        &self,
        ids: &[FlashcardId],
    ) -> Result<Vec<Flashcard>, FlashcardServiceError> {
        match self.flashcards.get_flashcards(ids).await {
            Ok(cards) => Ok(cards),
            Err(StorageError::NotFound) => {
                for &id in ids {
                    if self.flashcards.get_flashcard(id).await?.is_none() {
                        return Err(FlashcardServiceError::NotFound(id));
                    }
                }
                // Deleted and re-created between the two reads.
                Err(StorageError::NotFound.into())
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Apply a partial update, re-validating the merged document.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardServiceError::NotFound` if the card is missing, or
    /// `FlashcardServiceError::Flashcard` if the result does not validate.
    pub async fn update(
        &self,
        id: FlashcardId,
        patch: FlashcardPatch,
    ) -> Result<Flashcard, FlashcardServiceError> {
        let current = self.get(id).await?;
        let updated = current.apply_patch(patch, self.clock.now())?;
        self.persist(&updated).await?;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `FlashcardServiceError::NotFound` if no card has this id.
    pub async fn delete(&self, id: FlashcardId) -> Result<(), FlashcardServiceError> {
        self.flashcards.delete_flashcard(id).await.map_err(|e| match e {
            StorageError::NotFound => FlashcardServiceError::NotFound(id),
            other => FlashcardServiceError::Storage(other),
        })?;
        debug!(card_id = %id, "deleted flashcard");
        Ok(())
    }

    /// Validate an upload and store it on the card, replacing any earlier file.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardServiceError::Media` for oversized, empty or disallowed
    /// payloads, and `FlashcardServiceError::NotFound` if the card is missing.
    pub async fn attach_file(
        &self,
        id: FlashcardId,
        file: FileDraft,
    ) -> Result<Flashcard, FlashcardServiceError> {
        let file = file.validate()?;
        let card = self.get(id).await?.with_file(file, self.clock.now());
        self.persist(&card).await?;
        debug!(card_id = %id, "attached file to flashcard");
        Ok(card)
    }

    async fn persist(&self, card: &Flashcard) -> Result<(), FlashcardServiceError> {
        self.flashcards
            .update_flashcard(card)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => FlashcardServiceError::NotFound(card.id()),
                other => FlashcardServiceError::Storage(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashcards_core::model::{FlashcardError, MediaValidationError, ResponseType};
    use flashcards_core::time::fixed_now;
    use storage::InMemoryRepository;

    fn service() -> FlashcardService {
        FlashcardService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()))
    }

    fn image(mime: &str, len: usize) -> FileDraft {
        FileDraft {
            mime_type: mime.into(),
            data: vec![0xAB; len],
            part_of_prompt: Some(true),
        }
    }

    #[tokio::test]
    async fn create_then_read_returns_same_fields() {
        let service = service();
        let cases = [
            ("Capital of France?", "Paris", ResponseType::Text),
            ("Draw a cat", "cat", ResponseType::Drawn),
            ("Say hello in French", "bonjour", ResponseType::Recorded),
        ];
        for (prompt, response, kind) in cases {
            let created = service
                .create(FlashcardDraft::new(prompt, response, kind))
                .await
                .unwrap();
            let read = service.get(created.id()).await.unwrap();
            assert_eq!(read.prompt(), prompt);
            assert_eq!(read.response(), response);
            assert_eq!(read.user_response_type(), kind);
        }
    }

    #[tokio::test]
    async fn create_rejects_invalid_drafts() {
        let service = service();
        let err = service
            .create(FlashcardDraft::new("", "A", ResponseType::Text))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlashcardServiceError::Flashcard(FlashcardError::EmptyPrompt)
        ));
    }

    #[tokio::test]
    async fn update_revalidates_and_reports_missing() {
        let service = service();
        let card = service
            .create(FlashcardDraft::new("Q", "A", ResponseType::Text))
            .await
            .unwrap();

        let err = service
            .update(
                card.id(),
                FlashcardPatch {
                    user_response_type: Some("typed".into()),
                    ..FlashcardPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlashcardServiceError::Flashcard(FlashcardError::InvalidResponseType(_))
        ));
        assert_eq!(
            service.get(card.id()).await.unwrap().user_response_type(),
            ResponseType::Text
        );

        let updated = service
            .update(
                card.id(),
                FlashcardPatch {
                    prompt: Some("Q2".into()),
                    ..FlashcardPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.prompt(), "Q2");
        assert_eq!(updated.response(), "A");

        let missing = FlashcardId::new(999);
        assert!(matches!(
            service.update(missing, FlashcardPatch::default()).await,
            Err(FlashcardServiceError::NotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let service = service();
        let card = service
            .create(FlashcardDraft::new("Q", "A", ResponseType::Text))
            .await
            .unwrap();
        service.delete(card.id()).await.unwrap();
        assert!(matches!(
            service.delete(card.id()).await,
            Err(FlashcardServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn attach_file_enforces_size_and_type() {
        let service = service();
        let card = service
            .create(FlashcardDraft::new("What is this?", "A cat", ResponseType::Text))
            .await
            .unwrap();

        let err = service
            .attach_file(card.id(), image("image/jpeg", 600_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlashcardServiceError::Media(MediaValidationError::TooLarge { .. })
        ));

        for mime in ["application/pdf", "image/tiff"] {
            assert!(matches!(
                service.attach_file(card.id(), image(mime, 100)).await,
                Err(FlashcardServiceError::Media(_))
            ));
        }
        assert!(service.get(card.id()).await.unwrap().file().is_none());

        let updated = service
            .attach_file(card.id(), image("image/png", 100))
            .await
            .unwrap();
        let file = updated.file().unwrap();
        assert_eq!(file.mime().as_str(), "image/png");
        assert_eq!(file.data().len(), 100);
        assert!(
            service
                .get(card.id())
                .await
                .unwrap()
                .file()
                .is_some_and(|f| f.part_of_prompt())
        );
    }

    #[tokio::test]
    async fn attach_file_to_missing_card_fails_after_validation() {
        let service = service();
        let err = service
            .attach_file(FlashcardId::new(5), image("image/png", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, FlashcardServiceError::NotFound(_)));
    }
}
