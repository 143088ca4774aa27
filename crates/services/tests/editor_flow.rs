use flashcards_core::model::{FlashcardDraft, ResponseType};
use flashcards_core::time::fixed_now;
use services::{AppServices, CardRemoval, Clock, SetEditor, StagedCard};
use storage::repository::Storage;

fn text(prompt: &str, response: &str) -> FlashcardDraft {
    FlashcardDraft::new(prompt, response, ResponseType::Text)
}

#[tokio::test]
async fn editor_flow_create_edit_delete_restore() {
    let storage = Storage::sqlite("sqlite:file:memdb_editor_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let services = AppServices::from_storage(&storage, Clock::fixed(fixed_now()));
    let sets = services.study_sets();

    let set = sets.create("Capitals").await.expect("create set");
    let france = sets
        .add_card(set.id(), text("France?", "Paris"))
        .await
        .expect("add france");
    let spain = sets
        .add_card(set.id(), text("Spain?", "Barcelona"))
        .await
        .expect("add spain");
    let italy = sets
        .add_card(set.id(), text("Italy?", "Rome"))
        .await
        .expect("add italy");

    let mut editor = SetEditor::load(&sets, set.id()).await.expect("load editor");
    assert_eq!(editor.entries().len(), 3);
    assert!(!editor.is_dirty());

    editor.edit(1, text("Spain?", "Madrid")).expect("edit spain");
    editor.delete(2).expect("delete italy");
    let new_index = editor.add(text("Portugal?", "Lisbon"));
    let dropped_index = editor.add(text("Typo?", "oops"));
    editor.delete(dropped_index).expect("delete unsaved");
    editor.delete(0).expect("delete france");
    editor.restore(0).expect("restore france");
    assert!(matches!(editor.entries()[new_index], StagedCard::New { .. }));

    let report = editor.save(&sets).await.expect("save");
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.edited, vec![spain.card.id()]);
    assert_eq!(report.deleted, vec![(italy.card.id(), CardRemoval::Removed)]);
    assert_eq!(report.dropped, 1);
    assert!(!editor.is_dirty());

    let stored = sets.get(set.id()).await.expect("reload set");
    assert_eq!(
        stored.cards(),
        &[france.card.id(), spain.card.id(), report.created[0]]
    );
    assert_eq!(editor.set(), &stored);

    let cards = sets.cards_for_set(set.id()).await.expect("cards");
    let responses: Vec<&str> = cards.iter().map(|c| c.response()).collect();
    assert_eq!(responses, vec!["Paris", "Madrid", "Lisbon"]);

    let flashcards = services.flashcards();
    assert!(flashcards.get(italy.card.id()).await.is_err());
}

#[tokio::test]
async fn discard_leaves_store_untouched() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let sets = services.study_sets();
    let set = sets.create("Rivers").await.unwrap();
    sets.add_card(set.id(), text("Longest?", "Nile")).await.unwrap();

    let mut editor = SetEditor::load(&sets, set.id()).await.unwrap();
    editor.edit(0, text("Longest?", "Amazon")).unwrap();
    editor.add(text("Widest?", "Amazon"));
    editor.discard();

    let report = editor.save(&sets).await.unwrap();
    assert_eq!(report, services::SaveReport::default());
    let cards = sets.cards_for_set(set.id()).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].response(), "Nile");
}
