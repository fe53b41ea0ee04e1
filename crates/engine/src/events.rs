//! Narrow, single-list reconciliation driven by household change
//! notifications.

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use twinlist_clients::{BoardClient, HouseholdListClient, ItemStatus};

use crate::error::Result;
use crate::orchestrator::SyncEngine;
use crate::provision::resolve_schema;
use crate::state::{SyncedItem, SyncedList};

/// Kind of change the household service notified us about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    ItemsCreated,
    ItemsUpdated,
    ItemsDeleted,
}

/// One inbound change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub list_id: String,
    pub list_item_ids: Vec<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl<A, B> SyncEngine<A, B>
where
    A: HouseholdListClient,
    B: BoardClient,
{
    /// Applies one change notification to the board side and the cache.
    ///
    /// An untracked household list gets a board counterpart provisioned on
    /// demand, so a brand-new list syncs reactively instead of waiting for
    /// the next full pass. All per-item operations in the batch run
    /// concurrently; the cache is only touched after the whole batch has
    /// been awaited.
    pub async fn apply_event(&mut self, request: &EventRequest) -> Result<&[SyncedList]> {
        let mut current = match self.state().by_household_list(&request.list_id) {
            Some(list) => list.clone(),
            None => {
                let tracked = self.track_list(&request.list_id).await?;
                // Committed right away so a later remote failure does not
                // lose track of the board list that now exists.
                self.state_mut().upsert(tracked.clone());
                tracked
            }
        };
        let mut items = std::mem::take(&mut current.items);

        let household = self.household();
        let board = self.board();

        match request.kind {
            EventKind::ItemsCreated => {
                let fetched = try_join_all(
                    request
                        .list_item_ids
                        .iter()
                        .map(|id| household.item(&request.list_id, id)),
                )
                .await?;

                let mut ops: Vec<BoxFuture<'_, Result<SyncedItem>>> = Vec::new();
                for item in &fetched {
                    let value = item.value.to_lowercase();
                    let known = items
                        .iter()
                        .any(|si| si.value == value || si.household_id == item.id);
                    if known {
                        debug!(value = %value, "created item already tracked; skipping");
                        continue;
                    }
                    let board_list_id = current.board_list_id;
                    let title_field = &current.title_field;
                    ops.push(
                        async move {
                            let handle =
                                board.add_entry(board_list_id, title_field, &value).await?;
                            Ok(SyncedItem::link(item, &handle.uuid, handle.id))
                        }
                        .boxed(),
                    );
                }
                let new_items = try_join_all(ops).await?;
                items.extend(new_items);
            }
            EventKind::ItemsUpdated => {
                let fetched = try_join_all(
                    request
                        .list_item_ids
                        .iter()
                        .map(|id| household.item(&request.list_id, id)),
                )
                .await?;

                let mut ops: Vec<BoxFuture<'_, Result<()>>> = Vec::new();
                let mut refreshed: Vec<usize> = Vec::new();
                for (fetched_idx, item) in fetched.iter().enumerate() {
                    let Some(idx) = items.iter().position(|si| si.household_id == item.id)
                    else {
                        // A notification about an item the engine never
                        // created cannot be reconciled; remove it to
                        // restore convergence.
                        warn!(item_id = %item.id, "update for untracked item; deleting from household list");
                        let list_id = &request.list_id;
                        ops.push(
                            async move {
                                household.delete_item(list_id, &item.id).await?;
                                Ok(())
                            }
                            .boxed(),
                        );
                        continue;
                    };

                    let cached = &items[idx];
                    if item.updated_time <= cached.updated_time {
                        debug!(item_id = %item.id, "stale update notification; skipping");
                        continue;
                    }

                    let value = item.value.to_lowercase();
                    if cached.value != value {
                        let board_list_id = current.board_list_id;
                        let entry_id = cached.board_entry_id;
                        let title_field = &current.title_field;
                        ops.push(
                            async move {
                                board
                                    .rename_entry(board_list_id, entry_id, title_field, &value)
                                    .await?;
                                Ok(())
                            }
                            .boxed(),
                        );
                    }
                    if cached.status != item.status {
                        let board_list_id = current.board_list_id;
                        let entry_id = cached.board_entry_id;
                        let stage_field = &current.stage_field;
                        let category = current.category_for(item.status);
                        ops.push(
                            async move {
                                board
                                    .set_entry_stage(board_list_id, entry_id, stage_field, category)
                                    .await?;
                                Ok(())
                            }
                            .boxed(),
                        );
                    }
                    refreshed.push(fetched_idx);
                }
                try_join_all(ops).await?;
                for fetched_idx in refreshed {
                    let item = &fetched[fetched_idx];
                    if let Some(si) = items.iter_mut().find(|si| si.household_id == item.id) {
                        si.refresh(item);
                    }
                }
            }
            EventKind::ItemsDeleted => {
                let mut ops: Vec<BoxFuture<'_, Result<()>>> = Vec::new();
                let mut removed: Vec<String> = Vec::new();
                for item_id in &request.list_item_ids {
                    let Some(si) = items.iter().find(|si| &si.household_id == item_id) else {
                        debug!(item_id = %item_id, "delete for untracked item; nothing to do");
                        continue;
                    };
                    let board_list_id = current.board_list_id;
                    let uuid = si.board_uuid.clone();
                    ops.push(
                        async move {
                            board.delete_entry(board_list_id, &uuid).await?;
                            Ok(())
                        }
                        .boxed(),
                    );
                    removed.push(item_id.clone());
                }
                try_join_all(ops).await?;
                items.retain(|si| !removed.contains(&si.household_id));
            }
        }

        current.items = items;
        self.state_mut().upsert(current);
        Ok(self.state().lists())
    }

    /// Provisions a board counterpart for a household list the cache has
    /// never seen. The new list lands in the workspace of any already
    /// synced list, falling back to a workspace lookup on an empty cache.
    async fn track_list(&self, list_id: &str) -> Result<SyncedList> {
        let page = self.household().list(list_id, ItemStatus::Active).await?;
        let workspace_id = match self.state().lists().first() {
            Some(list) => list.workspace_id,
            None => self.board().workspace().await?.id,
        };
        info!(name = %page.name, workspace_id, "provisioning board list for untracked household list");
        let created = self.board().create_list(&page.name, workspace_id).await?;
        let elements = self.board().elements(&created.short_id).await?;
        let handle = resolve_schema(
            &page.name,
            &created.short_id,
            created.id,
            created.workspace_id,
            &elements,
        )?;
        Ok(SyncedList {
            household_list_id: list_id.to_string(),
            household_list_name: page.name.clone(),
            board_list_name: page.name,
            board_list_id: handle.id,
            board_short_id: handle.short_id,
            workspace_id: handle.workspace_id,
            title_field: handle.title_field,
            stage_field: handle.stage_field,
            complete_category: handle.complete_category,
            incomplete_category: handle.incomplete_category,
            items: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_request_parses_notification_payload() {
        let json = r#"{
            "listId": "hl-1",
            "listItemIds": ["hi-1", "hi-2"],
            "type": "ItemsUpdated"
        }"#;
        let request: EventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.list_id, "hl-1");
        assert_eq!(request.list_item_ids.len(), 2);
        assert_eq!(request.kind, EventKind::ItemsUpdated);
    }
}
