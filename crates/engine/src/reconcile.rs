//! The three-way item diff for a single list pair.
//!
//! Phase 1 walks the board entries: the board's crossed-off flag is
//! authoritative for completion state during a full pass, so household
//! items are updated or created to match. Phase 2 walks the household
//! orphans: on first-ever sync they are imported into the board, after
//! that boundary they are purged from the household side because the
//! board has become authoritative for presence.
//!
//! All remote writes for the list fan out concurrently and are joined
//! before any correspondence record is produced; a single failure aborts
//! the whole list so the cache is never committed from a partial batch.

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use tracing::{debug, warn};
use twinlist_clients::{
    BoardClient, BoardEntry, HouseholdItem, HouseholdItemUpdate, HouseholdListClient, ItemStatus,
    NewHouseholdItem,
};

use crate::error::Result;
use crate::provision::BoardListHandle;
use crate::state::{SyncedItem, SyncedList};

/// Identifiers of the list pair being reconciled.
pub(crate) struct ListPair<'a> {
    pub household_list_id: &'a str,
    pub household_list_name: &'a str,
    pub board_list_name: &'a str,
    pub handle: &'a BoardListHandle,
}

fn value_matches(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Reconciles one list pair and returns its fresh correspondence record.
pub(crate) async fn reconcile_list<A, B>(
    household: &A,
    board: &B,
    pair: ListPair<'_>,
    household_items: &[HouseholdItem],
    board_entries: &[BoardEntry],
    new_user: bool,
) -> Result<SyncedList>
where
    A: HouseholdListClient,
    B: BoardClient,
{
    let list_id = pair.household_list_id;
    let handle = pair.handle;
    let mut ops: Vec<BoxFuture<'_, Result<Option<SyncedItem>>>> = Vec::new();

    // Phase 1: board entries drive household status.
    for entry in board_entries {
        let entry_status = ItemStatus::from_completed(entry.completed);
        match household_items
            .iter()
            .find(|item| value_matches(&item.value, &entry.display_text))
        {
            Some(item) if item.status == entry_status => {
                // Already in agreement; refresh the cache entry only.
                let synced = SyncedItem::link(item, &entry.uuid, entry.id);
                ops.push(async move { Ok(Some(synced)) }.boxed());
            }
            Some(item) => {
                ops.push(
                    async move {
                        debug!(value = %item.value, status = entry_status.as_str(),
                            "aligning household item with board stage");
                        let updated = household
                            .update_item(
                                list_id,
                                &item.id,
                                HouseholdItemUpdate {
                                    value: item.value.clone(),
                                    status: entry_status,
                                    version: item.version,
                                },
                            )
                            .await?;
                        Ok(Some(SyncedItem::link(&updated, &entry.uuid, entry.id)))
                    }
                    .boxed(),
                );
            }
            None => {
                ops.push(
                    async move {
                        debug!(value = %entry.display_text, "importing board entry into household list");
                        let created = household
                            .create_item(
                                list_id,
                                NewHouseholdItem {
                                    value: entry.display_text.to_lowercase(),
                                    status: entry_status,
                                },
                            )
                            .await?;
                        Ok(Some(SyncedItem::link(&created, &entry.uuid, entry.id)))
                    }
                    .boxed(),
                );
            }
        }
    }

    // Phase 2: household items the board has never heard of.
    for item in household_items.iter().filter(|item| {
        board_entries
            .iter()
            .all(|entry| !value_matches(&item.value, &entry.display_text))
    }) {
        if new_user {
            ops.push(
                async move {
                    debug!(value = %item.value, "importing household item into board list");
                    let created = board
                        .add_entry(handle.id, &handle.title_field, &item.value.to_lowercase())
                        .await?;
                    Ok(Some(SyncedItem::link(item, &created.uuid, created.id)))
                }
                .boxed(),
            );
        } else {
            ops.push(
                async move {
                    warn!(value = %item.value, "purging household item unknown to the board");
                    household.delete_item(list_id, &item.id).await?;
                    Ok(None)
                }
                .boxed(),
            );
        }
    }

    let results = try_join_all(ops).await?;
    Ok(SyncedList {
        household_list_id: pair.household_list_id.to_string(),
        household_list_name: pair.household_list_name.to_string(),
        board_list_name: pair.board_list_name.to_string(),
        board_list_id: handle.id,
        board_short_id: handle.short_id.clone(),
        workspace_id: handle.workspace_id,
        title_field: handle.title_field.clone(),
        stage_field: handle.stage_field.clone(),
        complete_category: handle.complete_category,
        incomplete_category: handle.incomplete_category,
        items: results.into_iter().flatten().collect(),
    })
}
