use flashcards_core::model::{Flashcard, StudySet, StudySetId};
use flashcards_core::quiz::{GradedQuiz, QuizError, QuizResponse};
use tracing::info;

use crate::error::QuizServiceError;
use crate::study_set_service::StudySetService;

/// A set and its cards, ready to be answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub set: StudySet,
    pub cards: Vec<Flashcard>,
}

impl Quiz {
    /// Grade responses against this quiz's cards.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the responses do not line up with the cards or a
    /// typed answer is blank.
    pub fn grade(&self, responses: &[QuizResponse]) -> Result<GradedQuiz, QuizError> {
        GradedQuiz::grade(&self.cards, responses)
    }
}

/// Loads quizzes and records their results on the owning set.
#[derive(Clone)]
pub struct QuizService {
    sets: StudySetService,
}

impl QuizService {
    #[must_use]
    pub fn new(sets: StudySetService) -> Self {
        Self { sets }
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::StudySet` if the set or one of its cards
    /// cannot be loaded.
    pub async fn load(&self, set_id: StudySetId) -> Result<Quiz, QuizServiceError> {
        let set = self.sets.get(set_id).await?;
        let cards = self.sets.cards_for_set(set_id).await?;
        Ok(Quiz { set, cards })
    }

    /// Append the graded fraction to the set's score history.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` while any verdict is unresolved or the
    /// quiz is empty; nothing is recorded in that case.
    pub async fn submit(
        &self,
        set_id: StudySetId,
        graded: &GradedQuiz,
    ) -> Result<StudySet, QuizServiceError> {
        let fraction = graded.fraction_correct()?;
        let set = self.sets.record_quiz_score(set_id, fraction).await?;
        info!(set_id = %set_id, fraction, "quiz submitted");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use flashcards_core::model::{FlashcardDraft, ResponseType};
    use flashcards_core::quiz::{MediaRef, ResponseData};
    use flashcards_core::time::fixed_now;
    use storage::Storage;

    use crate::Clock;
    use crate::flashcard_service::FlashcardService;

    fn sets() -> StudySetService {
        let storage = Storage::in_memory();
        let clock = Clock::fixed(fixed_now());
        let flashcards = FlashcardService::new(clock, Arc::clone(&storage.flashcards));
        StudySetService::new(clock, Arc::clone(&storage.sets), flashcards)
    }

    #[tokio::test]
    async fn grades_and_records_fraction() {
        let sets = sets();
        let quiz_service = QuizService::new(sets.clone());
        let set = sets.create("Capitals").await.unwrap();
        for (prompt, response) in [("France?", "Paris"), ("Italy?", "Rome")] {
            sets.add_card(set.id(), FlashcardDraft::new(prompt, response, ResponseType::Text))
                .await
                .unwrap();
        }

        let quiz = quiz_service.load(set.id()).await.unwrap();
        let responses: Vec<QuizResponse> = quiz
            .cards
            .iter()
            .zip([" paris ", "London"])
            .map(|(card, answer)| QuizResponse::text(card.id(), answer))
            .collect();
        let graded = quiz.grade(&responses).unwrap();

        let updated = quiz_service.submit(set.id(), &graded).await.unwrap();
        assert_eq!(updated.quiz_scores().len(), 1);
        assert!((updated.quiz_scores()[0].value() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unresolved_media_answers_block_submission() {
        let sets = sets();
        let quiz_service = QuizService::new(sets.clone());
        let set = sets.create("Sketches").await.unwrap();
        sets.add_card(set.id(), FlashcardDraft::new("Draw a cat", "cat", ResponseType::Drawn))
            .await
            .unwrap();

        let quiz = quiz_service.load(set.id()).await.unwrap();
        let responses = vec![QuizResponse {
            card_id: quiz.cards[0].id(),
            answer: ResponseData::Drawn(MediaRef::new("blob:1")),
        }];
        let mut graded = quiz.grade(&responses).unwrap();

        assert!(matches!(
            quiz_service.submit(set.id(), &graded).await,
            Err(QuizServiceError::Quiz(QuizError::Unresolved { count: 1 }))
        ));
        assert!(sets.get(set.id()).await.unwrap().quiz_scores().is_empty());

        graded.override_verdict(0, true).unwrap();
        let updated = quiz_service.submit(set.id(), &graded).await.unwrap();
        assert!((updated.quiz_scores()[0].value() - 1.0).abs() < f64::EPSILON);
    }
}
