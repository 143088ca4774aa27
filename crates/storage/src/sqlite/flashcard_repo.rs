use std::collections::HashMap;

use flashcards_core::model::{Flashcard, FlashcardId};

use super::SqliteRepository;
use super::mapping::{flashcard_id_from_i64, id_to_i64, map_flashcard_row};
use crate::repository::{FlashcardRepository, NewFlashcardRecord, StorageError};

const FLASHCARD_COLUMNS: &str = "id, prompt, response, user_response_type, file_type, file_data, \
                                 file_part_of_prompt, created_at, updated_at";

#[async_trait::async_trait]
impl FlashcardRepository for SqliteRepository {
    async fn insert_new_flashcard(
        &self,
        card: NewFlashcardRecord,
    ) -> Result<FlashcardId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO flashcards (prompt, response, user_response_type, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ",
        )
        .bind(card.prompt)
        .bind(card.response)
        .bind(card.user_response_type.as_str())
        .bind(card.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        flashcard_id_from_i64(res.last_insert_rowid())
    }

    async fn get_flashcard(&self, id: FlashcardId) -> Result<Option<Flashcard>, StorageError> {
        let sql = format!("SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("flashcard_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_flashcard_row).transpose()
    }

    async fn get_flashcards(&self, ids: &[FlashcardId]) -> Result<Vec<Flashcard>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id IN ({placeholders})");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(id_to_i64("flashcard_id", id.value())?);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut by_id: HashMap<FlashcardId, Flashcard> = HashMap::with_capacity(rows.len());
        for row in rows {
            let card = map_flashcard_row(&row)?;
            by_id.insert(card.id(), card);
        }

        // A set may list the same id twice, so clone rather than remove.
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.get(id) {
                Some(card) => out.push(card.clone()),
                None => return Err(StorageError::NotFound),
            }
        }
        Ok(out)
    }

    async fn update_flashcard(&self, card: &Flashcard) -> Result<(), StorageError> {
        let file = card.file();
        let res = sqlx::query(
            r"
            UPDATE flashcards SET
                prompt = ?2,
                response = ?3,
                user_response_type = ?4,
                file_type = ?5,
                file_data = ?6,
                file_part_of_prompt = ?7,
                updated_at = ?8
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("flashcard_id", card.id().value())?)
        .bind(card.prompt())
        .bind(card.response())
        .bind(card.user_response_type().as_str())
        .bind(file.map(|f| f.mime().as_str().to_owned()))
        .bind(file.map(|f| f.data().to_vec()))
        .bind(file.map(|f| i64::from(f.part_of_prompt())))
        .bind(card.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_flashcard(&self, id: FlashcardId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM flashcards WHERE id = ?1")
            .bind(id_to_i64("flashcard_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_flashcard_ids(&self) -> Result<Vec<FlashcardId>, StorageError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM flashcards ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        ids.into_iter().map(flashcard_id_from_i64).collect()
    }
}
