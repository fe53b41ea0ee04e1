//! Fallback notice for a broken account link.
//!
//! When reconciliation cannot run at all (expired credentials, revoked
//! consent), the one thing guaranteed to still work is the household
//! side. This writes a single sentinel item into the household to-do
//! list telling the user to re-link, and never writes it twice.

use tracing::info;
use twinlist_clients::{BoardClient, HouseholdListClient, ItemStatus, NewHouseholdItem};

use crate::error::{Result, SyncError};
use crate::orchestrator::SyncEngine;

/// Exact text of the sentinel item; idempotence keys on it.
pub const SYNC_BROKEN_NOTICE: &str =
    "List sync is not set up correctly! Open the companion app and re-link your account.";

/// What the notifier did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeOutcome {
    Created,
    AlreadyPresent,
}

impl<A, B> SyncEngine<A, B>
where
    A: HouseholdListClient,
    B: BoardClient,
{
    /// Writes the sync-broken sentinel into the household to-do list,
    /// unless an identical item is already there.
    pub async fn notify_sync_broken(&self) -> Result<NoticeOutcome> {
        let todo_name = &self.rules().household_todo;
        let metas = self.household().lists_metadata().await?;
        let list_id = metas
            .iter()
            .find(|meta| &meta.name == todo_name)
            .map(|meta| meta.list_id.clone())
            .ok_or_else(|| SyncError::UnknownHouseholdList {
                name: todo_name.clone(),
            })?;

        let page = self.household().list(&list_id, ItemStatus::Active).await?;
        if page.items.iter().any(|item| item.value == SYNC_BROKEN_NOTICE) {
            return Ok(NoticeOutcome::AlreadyPresent);
        }

        info!(list = %todo_name, "writing sync-broken notice");
        self.household()
            .create_item(
                &list_id,
                NewHouseholdItem {
                    value: SYNC_BROKEN_NOTICE.to_string(),
                    status: ItemStatus::Active,
                },
            )
            .await?;
        Ok(NoticeOutcome::Created)
    }
}
