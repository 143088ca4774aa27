use flashcards_core::model::{FlashcardId, QuizScore, StudySet, StudySetId};
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_study_set_row, study_set_id_from_i64};
use crate::repository::{NewStudySetRecord, StorageError, StudySetRepository};

#[async_trait::async_trait]
impl StudySetRepository for SqliteRepository {
    async fn insert_new_set(&self, set: NewStudySetRecord) -> Result<StudySetId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO study_sets (title, cards, quiz_scores, created_at)
            VALUES (?1, '[]', '[]', ?2)
            ",
        )
        .bind(set.title)
        .bind(set.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        study_set_id_from_i64(res.last_insert_rowid())
    }

    async fn get_set(&self, id: StudySetId) -> Result<Option<StudySet>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, cards, quiz_scores, created_at
            FROM study_sets WHERE id = ?1
            ",
        )
        .bind(id_to_i64("study_set_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_study_set_row).transpose()
    }

    async fn list_sets(&self) -> Result<Vec<StudySet>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, cards, quiz_scores, created_at
            FROM study_sets
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut sets = Vec::with_capacity(rows.len());
        for row in rows {
            sets.push(map_study_set_row(&row)?);
        }
        Ok(sets)
    }

    async fn rename_set(&self, id: StudySetId, title: &str) -> Result<StudySet, StorageError> {
        let row = sqlx::query(
            r"
            UPDATE study_sets SET title = ?2
            WHERE id = ?1
            RETURNING id, title, cards, quiz_scores, created_at
            ",
        )
        .bind(id_to_i64("study_set_id", id.value())?)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        returned_set(row.as_ref())
    }

    async fn link_card(
        &self,
        id: StudySetId,
        card_id: FlashcardId,
    ) -> Result<StudySet, StorageError> {
        let row = sqlx::query(
            r"
            UPDATE study_sets SET cards = json_insert(cards, '$[#]', ?2)
            WHERE id = ?1
            RETURNING id, title, cards, quiz_scores, created_at
            ",
        )
        .bind(id_to_i64("study_set_id", id.value())?)
        .bind(id_to_i64("flashcard_id", card_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        returned_set(row.as_ref())
    }

    async fn unlink_card(
        &self,
        id: StudySetId,
        card_id: FlashcardId,
    ) -> Result<StudySet, StorageError> {
        // The rewrite reads and writes the row inside one statement.
        let row = sqlx::query(
            r"
            UPDATE study_sets SET cards = (
                SELECT json_group_array(value) FROM (
                    SELECT value FROM json_each(study_sets.cards)
                    WHERE value <> ?2
                    ORDER BY key
                )
            )
            WHERE id = ?1
            RETURNING id, title, cards, quiz_scores, created_at
            ",
        )
        .bind(id_to_i64("study_set_id", id.value())?)
        .bind(id_to_i64("flashcard_id", card_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        returned_set(row.as_ref())
    }

    async fn append_quiz_score(
        &self,
        id: StudySetId,
        score: QuizScore,
    ) -> Result<StudySet, StorageError> {
        let row = sqlx::query(
            r"
            UPDATE study_sets SET quiz_scores = json_insert(quiz_scores, '$[#]', ?2)
            WHERE id = ?1
            RETURNING id, title, cards, quiz_scores, created_at
            ",
        )
        .bind(id_to_i64("study_set_id", id.value())?)
        .bind(score.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        returned_set(row.as_ref())
    }

    async fn delete_set(&self, id: StudySetId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM study_sets WHERE id = ?1")
            .bind(id_to_i64("study_set_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

fn returned_set(row: Option<&SqliteRow>) -> Result<StudySet, StorageError> {
    row.map(map_study_set_row)
        .transpose()?
        .ok_or(StorageError::NotFound)
}
