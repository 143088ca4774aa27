use flashcards_core::model::{
    FileDraft, FlashcardDraft, FlashcardId, FlashcardPatch, QuizScore, ResponseType,
};
use flashcards_core::time::fixed_now;
use storage::repository::{
    FlashcardRepository, NewFlashcardRecord, NewStudySetRecord, StorageError, StudySetRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn record(prompt: &str, response: &str, kind: ResponseType) -> NewFlashcardRecord {
    NewFlashcardRecord::from_validated(
        FlashcardDraft::new(prompt, response, kind)
            .validate(fixed_now())
            .unwrap(),
    )
}

#[tokio::test]
async fn sqlite_flashcard_roundtrip_with_file() {
    let repo = connect("memdb_flashcard_file").await;

    let id = repo
        .insert_new_flashcard(record("Say hello", "bonjour", ResponseType::Recorded))
        .await
        .unwrap();
    let card = repo.get_flashcard(id).await.unwrap().expect("stored");
    assert_eq!(card.prompt(), "Say hello");
    assert_eq!(card.response(), "bonjour");
    assert_eq!(card.user_response_type(), ResponseType::Recorded);
    assert!(card.file().is_none());

    let file = FileDraft {
        mime_type: "image/png".into(),
        data: vec![0x89, 0x50, 0x4e, 0x47],
        part_of_prompt: Some(true),
    }
    .validate()
    .unwrap();
    repo.update_flashcard(&card.with_file(file, fixed_now()))
        .await
        .unwrap();

    let stored = repo.get_flashcard(id).await.unwrap().unwrap();
    let file = stored.file().expect("file kept");
    assert_eq!(file.mime().as_str(), "image/png");
    assert_eq!(file.data(), &[0x89, 0x50, 0x4e, 0x47]);
    assert!(file.part_of_prompt());
}

#[tokio::test]
async fn sqlite_patch_persists_and_keeps_attachment() {
    let repo = connect("memdb_flashcard_patch").await;
    let id = repo
        .insert_new_flashcard(record("Q", "A", ResponseType::Text))
        .await
        .unwrap();
    let file = FileDraft {
        mime_type: "audio/ogg".into(),
        data: vec![7; 10],
        part_of_prompt: Some(false),
    }
    .validate()
    .unwrap();
    let card = repo
        .get_flashcard(id)
        .await
        .unwrap()
        .unwrap()
        .with_file(file, fixed_now());
    repo.update_flashcard(&card).await.unwrap();

    let patched = card
        .apply_patch(
            FlashcardPatch {
                response: Some("B".into()),
                ..FlashcardPatch::default()
            },
            fixed_now(),
        )
        .unwrap();
    repo.update_flashcard(&patched).await.unwrap();

    let stored = repo.get_flashcard(id).await.unwrap().unwrap();
    assert_eq!(stored.response(), "B");
    assert!(!stored.file().unwrap().part_of_prompt());
}

#[tokio::test]
async fn sqlite_study_set_keeps_card_order_and_scores() {
    let repo = connect("memdb_study_set").await;

    let set_id = repo
        .insert_new_set(NewStudySetRecord {
            title: "Capitals".into(),
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    let a = repo
        .insert_new_flashcard(record("France?", "Paris", ResponseType::Text))
        .await
        .unwrap();
    let b = repo
        .insert_new_flashcard(record("Italy?", "Rome", ResponseType::Text))
        .await
        .unwrap();

    let set = repo.get_set(set_id).await.unwrap().unwrap();
    assert!(set.cards().is_empty());
    repo.link_card(set_id, b).await.unwrap();
    repo.link_card(set_id, a).await.unwrap();
    repo.append_quiz_score(set_id, QuizScore::new(0.0).unwrap())
        .await
        .unwrap();
    repo.append_quiz_score(set_id, QuizScore::new(1.0).unwrap())
        .await
        .unwrap();
    let renamed = repo.rename_set(set_id, "European capitals").await.unwrap();
    assert_eq!(renamed.cards(), &[b, a]);

    let stored = repo.get_set(set_id).await.unwrap().unwrap();
    assert_eq!(stored.title(), "European capitals");
    assert_eq!(stored.cards(), &[b, a]);
    let scores: Vec<f64> = stored.quiz_scores().iter().map(|s| s.value()).collect();
    assert_eq!(scores, vec![0.0, 1.0]);

    let cards = repo.get_flashcards(stored.cards()).await.unwrap();
    assert_eq!(cards[0].response(), "Rome");
    assert_eq!(cards[1].response(), "Paris");
    assert_eq!(repo.list_sets().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_reports_missing_documents() {
    let repo = connect("memdb_missing").await;

    let id = repo
        .insert_new_flashcard(record("Q", "A", ResponseType::Drawn))
        .await
        .unwrap();
    let card = repo.get_flashcard(id).await.unwrap().unwrap();
    repo.delete_flashcard(id).await.unwrap();

    assert!(repo.get_flashcard(id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_flashcard(id).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.update_flashcard(&card).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.get_flashcards(&[id]).await,
        Err(StorageError::NotFound)
    ));

    let set_id = repo
        .insert_new_set(NewStudySetRecord {
            title: "Gone".into(),
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    repo.delete_set(set_id).await.unwrap();
    assert!(repo.get_set(set_id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_set(set_id).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.link_card(set_id, id).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.unlink_card(set_id, id).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.append_quiz_score(set_id, QuizScore::new(0.5).unwrap()).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.rename_set(set_id, "Still gone").await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_unlink_keeps_remaining_order() {
    let repo = connect("memdb_unlink").await;

    let set_id = repo
        .insert_new_set(NewStudySetRecord {
            title: "Rivers".into(),
            created_at: fixed_now(),
        })
        .await
        .unwrap();
    let ids: Vec<FlashcardId> = (1..=4).map(FlashcardId::new).collect();
    for &id in &ids {
        repo.link_card(set_id, id).await.unwrap();
    }

    let set = repo.unlink_card(set_id, ids[1]).await.unwrap();
    assert_eq!(set.cards(), &[ids[0], ids[2], ids[3]]);

    // Unlinking an id the set does not hold changes nothing.
    let set = repo.unlink_card(set_id, ids[1]).await.unwrap();
    assert_eq!(set.cards(), &[ids[0], ids[2], ids[3]]);

    for &id in &[ids[0], ids[2], ids[3]] {
        repo.unlink_card(set_id, id).await.unwrap();
    }
    let stored = repo.get_set(set_id).await.unwrap().unwrap();
    assert!(stored.cards().is_empty());
}

#[tokio::test]
async fn sqlite_does_not_reuse_deleted_ids() {
    let repo = connect("memdb_autoincrement").await;

    let first = repo
        .insert_new_flashcard(record("Q1", "A", ResponseType::Text))
        .await
        .unwrap();
    repo.delete_flashcard(first).await.unwrap();
    let second = repo
        .insert_new_flashcard(record("Q2", "A", ResponseType::Text))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(repo.list_flashcard_ids().await.unwrap(), vec![second]);
    assert!(second > FlashcardId::new(0));
}
