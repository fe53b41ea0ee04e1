//! The per-account correspondence cache.
//!
//! `SyncState` is rebuilt from both remotes on cold start and handed by
//! reference to both orchestrators; it is never global and never shared
//! across concurrent passes. Records serialize cleanly so a caller can
//! stash them between invocations (the event path is warm-started from a
//! previously returned table).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use twinlist_clients::{HouseholdItem, ItemStatus};

/// Correspondence between one household item and one board entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedItem {
    pub household_id: String,
    pub board_uuid: String,
    pub board_entry_id: i64,
    pub status: ItemStatus,
    /// Household clock; source of truth for last-write-wins.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_time: OffsetDateTime,
    /// Stored case-folded; all value comparisons are case-insensitive.
    pub value: String,
    /// Opaque household-side concurrency token.
    pub version: i64,
}

impl SyncedItem {
    /// Builds the correspondence record for a household item and the board
    /// entry it now mirrors.
    pub fn link(item: &HouseholdItem, board_uuid: &str, board_entry_id: i64) -> Self {
        Self {
            household_id: item.id.clone(),
            board_uuid: board_uuid.to_string(),
            board_entry_id,
            status: item.status,
            updated_time: item.updated_time,
            value: item.value.to_lowercase(),
            version: item.version,
        }
    }

    /// Refreshes the household-owned fields after an accepted update.
    pub fn refresh(&mut self, item: &HouseholdItem) {
        self.status = item.status;
        self.updated_time = item.updated_time;
        self.value = item.value.to_lowercase();
        self.version = item.version;
    }
}

/// Correspondence between one household list and one board list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedList {
    pub household_list_id: String,
    pub household_list_name: String,
    pub board_list_name: String,
    pub board_list_id: i64,
    pub board_short_id: String,
    pub workspace_id: i64,
    /// Uuid of the board list's `Title` field.
    pub title_field: String,
    /// Uuid of the board list's `Stage` field.
    pub stage_field: String,
    /// Stage category id meaning "Done".
    pub complete_category: i64,
    /// Stage category id meaning "To-Do".
    pub incomplete_category: i64,
    pub items: Vec<SyncedItem>,
}

impl SyncedList {
    /// Stage category the board entry should carry for the given status.
    pub fn category_for(&self, status: ItemStatus) -> i64 {
        match status {
            ItemStatus::Completed => self.complete_category,
            ItemStatus::Active => self.incomplete_category,
        }
    }
}

/// The per-account table of correspondence records.
///
/// `household_list_id` is the stable join key: upserting a list replaces
/// any record with the same id, so at most one record exists per
/// household list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
    lists: Vec<SyncedList>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warm-starts the cache from previously stored records.
    pub fn from_lists(lists: Vec<SyncedList>) -> Self {
        Self { lists }
    }

    pub fn lists(&self) -> &[SyncedList] {
        &self.lists
    }

    pub fn into_lists(self) -> Vec<SyncedList> {
        self.lists
    }

    pub fn by_household_list(&self, list_id: &str) -> Option<&SyncedList> {
        self.lists
            .iter()
            .find(|l| l.household_list_id == list_id)
    }

    /// Inserts or replaces the record for `list.household_list_id`.
    pub fn upsert(&mut self, list: SyncedList) {
        match self
            .lists
            .iter_mut()
            .find(|l| l.household_list_id == list.household_list_id)
        {
            Some(slot) => *slot = list,
            None => self.lists.push(list),
        }
    }
}
