#![allow(clippy::float_cmp)]

use super::*;
use crate::permission::{BoardRole, capabilities};

fn grants() -> (CreateGrant, MutateGrant, DeleteGrant) {
    let caps = capabilities(BoardRole::Editor);
    (caps.create_grant().unwrap(), caps.mutate_grant().unwrap(), caps.delete_grant().unwrap())
}

fn make_sticker(id: &str, x: f64, y: f64) -> Sticker {
    Sticker {
        id: StickerId::permanent(id),
        board_id: "board-1".into(),
        x,
        y,
        width: 200.0,
        height: 200.0,
        text: String::new(),
        color: "#fff9b1".into(),
    }
}

fn new_sticker(x: f64, y: f64) -> NewSticker {
    NewSticker { rect: Rect::new(x, y, 0.0, 0.0), text: String::new(), color: "#daf7a6".into() }
}

fn ids(store: &StickerStore) -> Vec<StickerId> {
    store.all().iter().map(|s| s.id.clone()).collect()
}

// =============================================================
// StickerId
// =============================================================

#[test]
fn permanent_id_exposes_backend_id() {
    let id = StickerId::permanent("abc");
    assert!(!id.is_temporary());
    assert_eq!(id.as_permanent(), Some("abc"));
    assert_eq!(id.to_string(), "abc");
}

#[test]
fn temporary_id_has_no_backend_id() {
    let id = StickerId::Temporary(Uuid::new_v4());
    assert!(id.is_temporary());
    assert_eq!(id.as_permanent(), None);
    assert!(id.to_string().starts_with("temporary:"));
}

#[test]
fn temporary_never_equals_permanent_with_same_text() {
    let token = Uuid::new_v4();
    assert_ne!(StickerId::Temporary(token), StickerId::permanent(token.to_string()));
}

// =============================================================
// Records
// =============================================================

#[test]
fn record_converts_to_permanent_sticker() {
    let record = StickerRecord {
        id: "s1".into(),
        dashboard_id: "b1".into(),
        x: 1.0,
        y: 2.0,
        width: 100.0,
        height: 120.0,
        text: "hello".into(),
        color: "#ffffff".into(),
    };
    let sticker = Sticker::from(record.clone());
    assert_eq!(sticker.id, StickerId::permanent("s1"));
    assert_eq!(sticker.board_id, "b1");
    assert_eq!(sticker.to_record(), Some(record));
}

#[test]
fn provisional_sticker_has_no_record() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("b1");
    let temp = store.create_local(&create, new_sticker(0.0, 0.0));
    assert!(store.get(&temp).unwrap().to_record().is_none());
}

#[test]
fn record_deserializes_api_json() {
    let json = r##"{"id":"s9","dashboard_id":"b2","x":-5,"y":10.5,"text":"","width":100,"height":100,"color":"#d3d3d3"}"##;
    let record: StickerRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.id, "s9");
    assert_eq!(record.x, -5.0);
    assert_eq!(record.color, "#d3d3d3");
}

#[test]
fn patch_serializes_only_present_fields() {
    let json = serde_json::to_value(StickerPatch::text("hi")).unwrap();
    assert_eq!(json, serde_json::json!({ "text": "hi" }));
}

// =============================================================
// load
// =============================================================

#[test]
fn load_replaces_everything() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.create_local(&create, new_sticker(0.0, 0.0));
    store.load(vec![make_sticker("a", 0.0, 0.0), make_sticker("b", 10.0, 10.0)]);
    assert_eq!(ids(&store), vec![StickerId::permanent("a"), StickerId::permanent("b")]);
}

#[test]
fn load_keeps_ids_unique() {
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0), make_sticker("a", 50.0, 50.0)]);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&StickerId::permanent("a")).unwrap().x, 0.0);
}

#[test]
fn load_empty_clears() {
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    store.load(Vec::new());
    assert!(store.is_empty());
}

// =============================================================
// create_local / commit_create
// =============================================================

#[test]
fn create_local_is_visible_immediately() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(100.0, 100.0));
    assert!(temp.is_temporary());
    let sticker = store.get(&temp).unwrap();
    assert_eq!(sticker.board_id, "board-1");
    assert_eq!(sticker.color, "#daf7a6");
    assert_eq!(sticker.rect(), Rect::new(100.0, 100.0, 0.0, 0.0));
}

#[test]
fn create_local_ids_are_distinct() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    let mut seen = HashSet::new();
    for _ in 0..100 {
        let before = ids(&store);
        let temp = store.create_local(&create, new_sticker(0.0, 0.0));
        assert!(!before.contains(&temp));
        assert!(seen.insert(temp));
    }
}

#[test]
fn commit_create_swaps_in_place() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.load_more_for_test(make_sticker("c", 0.0, 0.0));

    let outcome = store.commit_create(&create, &temp, make_sticker("b", 5.0, 5.0));
    assert_eq!(outcome, CommitOutcome::Committed { id: StickerId::permanent("b"), resync: false });
    assert_eq!(
        ids(&store),
        vec![StickerId::permanent("a"), StickerId::permanent("b"), StickerId::permanent("c")]
    );
    assert!(store.get(&temp).is_none());
}

#[test]
fn commit_create_leaves_no_trace_of_temporary() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.commit_create(&create, &temp, make_sticker("b", 5.0, 5.0));
    assert_eq!(store.len(), 1);
    assert!(store.all().iter().all(|s| !s.id.is_temporary()));
    assert_eq!(store.commit_create(&create, &temp, make_sticker("b", 5.0, 5.0)), CommitOutcome::Unknown);
}

#[test]
fn commit_create_unknown_is_noop() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    let stray = StickerId::Temporary(Uuid::new_v4());
    assert_eq!(store.commit_create(&create, &stray, make_sticker("z", 0.0, 0.0)), CommitOutcome::Unknown);
    assert_eq!(ids(&store), vec![StickerId::permanent("a")]);
}

#[test]
fn commit_create_with_permanent_id_is_noop() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    let outcome = store.commit_create(&create, &StickerId::permanent("a"), make_sticker("z", 0.0, 0.0));
    assert_eq!(outcome, CommitOutcome::Unknown);
    assert_eq!(ids(&store), vec![StickerId::permanent("a")]);
}

#[test]
fn commit_create_after_local_delete_reports_orphan() {
    let (create, _, delete) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.submit_create(&create, &temp).unwrap();
    store.remove(&delete, &temp);

    let outcome = store.commit_create(&create, &temp, make_sticker("b", 5.0, 5.0));
    assert_eq!(outcome, CommitOutcome::Orphaned { id: StickerId::permanent("b") });
    assert!(store.is_empty());
    assert!(store.deleted_provisional.is_empty());
}

#[test]
fn removing_unsent_provisional_leaves_no_bookkeeping() {
    let (create, _, delete) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    assert!(store.remove(&delete, &temp).is_some());
    assert!(store.deleted_provisional.is_empty());
    assert!(store.creating.is_empty());
}

#[test]
fn submit_create_returns_current_provisional() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.shape_provisional(&create, &temp, Rect::new(5.0, 5.0, 100.0, 120.0));

    let sticker = store.submit_create(&create, &temp).unwrap();
    assert_eq!(sticker.id, temp);
    assert_eq!(sticker.rect(), Rect::new(5.0, 5.0, 100.0, 120.0));
    assert!(store.submit_create(&create, &StickerId::permanent("a")).is_none());
    assert!(store.submit_create(&create, &StickerId::Temporary(Uuid::new_v4())).is_none());
}

#[test]
fn failed_create_keeps_provisional_in_place() {
    let (create, mutate, _) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.submit_create(&create, &temp).unwrap();
    store.update(&mutate, &temp, &StickerPatch::text("typed while saving"));

    assert!(store.fail_create(&create, &temp));
    assert_eq!(ids(&store), vec![temp.clone()]);
    assert_eq!(store.get(&temp).unwrap().text, "typed while saving");
    assert!(store.creating.is_empty());
    assert!(store.edited_provisional.is_empty());
}

#[test]
fn failed_create_after_local_delete_clears_bookkeeping() {
    let (create, _, delete) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.submit_create(&create, &temp).unwrap();
    store.remove(&delete, &temp);

    assert!(!store.fail_create(&create, &temp));
    assert!(store.deleted_provisional.is_empty());
    assert!(store.is_empty());
}

#[test]
fn commit_create_keeps_edits_made_in_flight() {
    let (create, mutate, _) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.submit_create(&create, &temp).unwrap();
    store.update(&mutate, &temp, &StickerPatch::text("typed while saving"));

    let outcome = store.commit_create(&create, &temp, make_sticker("b", 5.0, 5.0));
    assert_eq!(outcome, CommitOutcome::Committed { id: StickerId::permanent("b"), resync: true });
    let sticker = store.get(&StickerId::permanent("b")).unwrap();
    assert_eq!(sticker.text, "typed while saving");
    assert_eq!(sticker.color, "#daf7a6");
}

#[test]
fn commit_create_does_not_duplicate_existing_permanent_id() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("b", 0.0, 0.0)]);
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    store.commit_create(&create, &temp, make_sticker("b", 5.0, 5.0));
    assert_eq!(ids(&store), vec![StickerId::permanent("b")]);
    assert_eq!(store.get(&StickerId::permanent("b")).unwrap().x, 5.0);
}

#[test]
fn shape_provisional_does_not_mark_edited() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    assert!(store.shape_provisional(&create, &temp, Rect::new(5.0, 5.0, 30.0, 40.0)));
    let outcome = store.commit_create(&create, &temp, make_sticker("b", 5.0, 5.0));
    assert_eq!(outcome, CommitOutcome::Committed { id: StickerId::permanent("b"), resync: false });
}

#[test]
fn shape_provisional_rejects_permanent_ids() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    assert!(!store.shape_provisional(&create, &StickerId::permanent("a"), Rect::new(1.0, 1.0, 1.0, 1.0)));
    assert_eq!(store.get(&StickerId::permanent("a")).unwrap().x, 0.0);
}

#[test]
fn abandon_create_drops_provisional() {
    let (create, _, _) = grants();
    let mut store = StickerStore::new("board-1");
    let temp = store.create_local(&create, new_sticker(5.0, 5.0));
    assert!(store.abandon_create(&create, &temp).is_some());
    assert!(store.is_empty());
    assert!(store.abandon_create(&create, &temp).is_none());
}

// =============================================================
// update / remove
// =============================================================

#[test]
fn update_merges_only_present_fields() {
    let (_, mutate, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 10.0, 20.0)]);
    let patch = StickerPatch { x: Some(99.0), ..Default::default() };
    let updated = store.update(&mutate, &StickerId::permanent("a"), &patch).unwrap();
    assert_eq!(updated.x, 99.0);
    assert_eq!(updated.y, 20.0);
    assert_eq!(updated.width, 200.0);
}

#[test]
fn update_text_and_color() {
    let (_, mutate, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    let id = StickerId::permanent("a");
    store.update(&mutate, &id, &StickerPatch::text("note"));
    store.update(&mutate, &id, &StickerPatch::color("#ffafb0"));
    let sticker = store.get(&id).unwrap();
    assert_eq!(sticker.text, "note");
    assert_eq!(sticker.color, "#ffafb0");
}

#[test]
fn update_unknown_is_noop() {
    let (_, mutate, _) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    assert!(store.update(&mutate, &StickerId::permanent("zzz"), &StickerPatch::text("x")).is_none());
    assert_eq!(store.get(&StickerId::permanent("a")).unwrap().text, "");
}

#[test]
fn remove_returns_removed() {
    let (_, _, delete) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0), make_sticker("b", 0.0, 0.0)]);
    let removed = store.remove(&delete, &StickerId::permanent("a")).unwrap();
    assert_eq!(removed.id, StickerId::permanent("a"));
    assert_eq!(ids(&store), vec![StickerId::permanent("b")]);
}

#[test]
fn remove_unknown_is_noop() {
    let (_, _, delete) = grants();
    let mut store = StickerStore::new("board-1");
    store.load(vec![make_sticker("a", 0.0, 0.0)]);
    assert!(store.remove(&delete, &StickerId::permanent("b")).is_none());
    assert_eq!(store.len(), 1);
}

impl StickerStore {
    fn load_more_for_test(&mut self, sticker: Sticker) {
        self.stickers.push(sticker);
    }
}
