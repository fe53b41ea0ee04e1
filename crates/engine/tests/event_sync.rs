//! Event-driven single-list reconciliation scenarios.

use twinlist_clients::ItemStatus;
use twinlist_engine::{EventKind, EventRequest, SyncEngine};
use twinlist_test_utils::{ts, FakeBoard, FakeHousehold};

struct Fixture {
    household: FakeHousehold,
    board: FakeBoard,
    engine: SyncEngine<FakeHousehold, FakeBoard>,
    list_id: String,
    board_id: i64,
}

/// A tracked, converged "Chores" pair with an empty item set.
async fn tracked_fixture() -> Fixture {
    let household = FakeHousehold::new();
    let board = FakeBoard::new();
    let list_id = household.add_list("Chores");
    let board_id = board.add_list("Chores");
    let mut engine = SyncEngine::new(household.clone(), board.clone());
    engine.run_full_sync(false).await.unwrap();
    Fixture {
        household,
        board,
        engine,
        list_id,
        board_id,
    }
}

fn event(list_id: &str, kind: EventKind, item_ids: &[&str]) -> EventRequest {
    EventRequest {
        list_id: list_id.to_string(),
        list_item_ids: item_ids.iter().map(|s| s.to_string()).collect(),
        kind,
    }
}

#[tokio::test]
async fn created_event_adds_board_entry_and_cache_record() {
    let mut fx = tracked_fixture().await;
    let item = fx
        .household
        .push_item(&fx.list_id, "Buy Milk", ItemStatus::Active);

    fx.engine
        .apply_event(&event(&fx.list_id, EventKind::ItemsCreated, &[&item.id]))
        .await
        .unwrap();

    let entries = fx.board.entries(fx.board_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].display_text, "buy milk");
    let synced = &fx.engine.state().lists()[0];
    assert_eq!(synced.items.len(), 1);
    assert_eq!(synced.items[0].household_id, item.id);

    // Re-delivering the same notification must not duplicate the entry.
    let writes = fx.board.write_count();
    fx.engine
        .apply_event(&event(&fx.list_id, EventKind::ItemsCreated, &[&item.id]))
        .await
        .unwrap();
    assert_eq!(fx.board.write_count(), writes);
    assert_eq!(fx.board.entries(fx.board_id).len(), 1);
}

#[tokio::test]
async fn stale_update_notification_produces_no_writes() {
    let household = FakeHousehold::new();
    let board = FakeBoard::new();
    let list_id = household.add_list("Chores");
    let board_id = board.add_list("Chores");
    let item = household.push_item_at(&list_id, "milk", ItemStatus::Active, ts(10));
    board.push_entry(board_id, "milk", false);

    let mut engine = SyncEngine::new(household.clone(), board.clone());
    engine.run_full_sync(false).await.unwrap();
    assert_eq!(board.write_count(), 0);

    // The item has not changed since the cache entry was taken, so the
    // notification's timestamp is not strictly newer and must be dropped.
    engine
        .apply_event(&event(&list_id, EventKind::ItemsUpdated, &[&item.id]))
        .await
        .unwrap();
    assert_eq!(board.write_count(), 0);
    assert_eq!(household.write_count(), 0);
}

#[tokio::test]
async fn newer_update_renames_and_restages_board_entry() {
    let household = FakeHousehold::new();
    let board = FakeBoard::new();
    let list_id = household.add_list("Chores");
    let board_id = board.add_list("Chores");
    let item = household.push_item_at(&list_id, "milk", ItemStatus::Active, ts(10));
    board.push_entry(board_id, "milk", false);

    let mut engine = SyncEngine::new(household.clone(), board.clone());
    engine.run_full_sync(false).await.unwrap();

    household.set_item(&list_id, &item.id, "Oat Milk", ItemStatus::Completed, ts(50));
    engine
        .apply_event(&event(&list_id, EventKind::ItemsUpdated, &[&item.id]))
        .await
        .unwrap();

    let entries = board.entries(board_id);
    assert_eq!(entries[0].display_text, "oat milk");
    assert!(entries[0].completed);
    assert_eq!(board.write_count(), 2);

    let synced = &engine.state().lists()[0].items[0];
    assert_eq!(synced.value, "oat milk");
    assert_eq!(synced.status, ItemStatus::Completed);
    assert_eq!(synced.updated_time, ts(50));
}

#[tokio::test]
async fn update_without_changes_only_refreshes_cache() {
    let household = FakeHousehold::new();
    let board = FakeBoard::new();
    let list_id = household.add_list("Chores");
    let board_id = board.add_list("Chores");
    let item = household.push_item_at(&list_id, "milk", ItemStatus::Active, ts(10));
    board.push_entry(board_id, "milk", false);

    let mut engine = SyncEngine::new(household.clone(), board.clone());
    engine.run_full_sync(false).await.unwrap();

    // Newer timestamp, identical value and status: nothing to push.
    household.set_item(&list_id, &item.id, "milk", ItemStatus::Active, ts(50));
    engine
        .apply_event(&event(&list_id, EventKind::ItemsUpdated, &[&item.id]))
        .await
        .unwrap();

    assert_eq!(board.write_count(), 0);
    assert_eq!(engine.state().lists()[0].items[0].updated_time, ts(50));
}

#[tokio::test]
async fn update_for_untracked_item_deletes_it_from_household() {
    let mut fx = tracked_fixture().await;
    let stray = fx
        .household
        .push_item(&fx.list_id, "mystery", ItemStatus::Active);

    fx.engine
        .apply_event(&event(&fx.list_id, EventKind::ItemsUpdated, &[&stray.id]))
        .await
        .unwrap();

    assert!(fx.household.items(&fx.list_id).is_empty());
    assert!(fx.engine.state().lists()[0].items.is_empty());
    assert_eq!(fx.board.write_count(), 0);
}

#[tokio::test]
async fn deleted_event_removes_board_entry_and_is_idempotent() {
    let mut fx = tracked_fixture().await;
    let item = fx
        .household
        .push_item(&fx.list_id, "milk", ItemStatus::Active);
    fx.engine
        .apply_event(&event(&fx.list_id, EventKind::ItemsCreated, &[&item.id]))
        .await
        .unwrap();
    assert_eq!(fx.board.entries(fx.board_id).len(), 1);

    fx.engine
        .apply_event(&event(&fx.list_id, EventKind::ItemsDeleted, &[&item.id]))
        .await
        .unwrap();
    assert!(fx.board.entries(fx.board_id).is_empty());
    assert!(fx.engine.state().lists()[0].items.is_empty());

    // The identical event again finds nothing in the cache: no-op.
    let writes = fx.board.write_count();
    fx.engine
        .apply_event(&event(&fx.list_id, EventKind::ItemsDeleted, &[&item.id]))
        .await
        .unwrap();
    assert_eq!(fx.board.write_count(), writes);
}

#[tokio::test]
async fn untracked_list_is_provisioned_on_demand() {
    let household = FakeHousehold::new();
    let board = FakeBoard::new();
    let list_id = household.add_list("Errands");
    let item = household.push_item(&list_id, "post office", ItemStatus::Active);

    // Cold cache: no full sync has ever run for this account.
    let mut engine = SyncEngine::new(household.clone(), board.clone());
    engine
        .apply_event(&event(&list_id, EventKind::ItemsCreated, &[&item.id]))
        .await
        .unwrap();

    let board_id = board.list_id("Errands").expect("board list provisioned");
    let entries = board.entries(board_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].display_text, "post office");
    // With an empty cache the workspace had to be looked up directly.
    assert_eq!(board.workspace_calls(), 1);

    let synced = engine.state().by_household_list(&list_id).unwrap();
    assert_eq!(synced.board_list_name, "Errands");
    assert_eq!(synced.items.len(), 1);
}

#[tokio::test]
async fn event_for_tracked_list_reuses_cached_workspace() {
    let mut fx = tracked_fixture().await;
    let workspace_calls = fx.board.workspace_calls();

    let other_list = fx.household.add_list("Errands");
    let item = fx
        .household
        .push_item(&other_list, "post office", ItemStatus::Active);
    fx.engine
        .apply_event(&event(&other_list, EventKind::ItemsCreated, &[&item.id]))
        .await
        .unwrap();

    // The new board list lands in the workspace of the already-synced
    // list without another workspace lookup.
    assert_eq!(fx.board.workspace_calls(), workspace_calls);
    assert!(fx.board.list_id("Errands").is_some());
}
