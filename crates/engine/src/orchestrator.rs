//! Whole-account reconciliation.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use futures::try_join;
use tracing::{debug, info};
use twinlist_clients::{
    BoardClient, BoardEntry, HouseholdItem, HouseholdListClient, ItemStatus, ListState,
};

use crate::error::{Result, SyncError};
use crate::mapping::NameRules;
use crate::provision;
use crate::reconcile::{reconcile_list, ListPair};
use crate::state::{SyncState, SyncedList};

/// Snapshot of one household list during a full pass.
struct HouseholdSnapshot {
    list_id: String,
    items: Vec<HouseholdItem>,
}

/// Coordinates reconciliation between the two services for one account.
///
/// The engine owns the correspondence cache; the caller serializes passes
/// per account (one invocation at a time), which is the unit of isolation.
pub struct SyncEngine<A, B> {
    household: A,
    board: B,
    rules: NameRules,
    state: SyncState,
}

impl<A, B> SyncEngine<A, B>
where
    A: HouseholdListClient,
    B: BoardClient,
{
    /// Creates an engine with a cold cache and default name rules.
    pub fn new(household: A, board: B) -> Self {
        Self::with_state(household, board, NameRules::default(), SyncState::new())
    }

    /// Creates an engine warm-started from previously stored state.
    pub fn with_state(household: A, board: B, rules: NameRules, state: SyncState) -> Self {
        Self {
            household,
            board,
            rules,
            state,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Consumes the engine, handing the cache back for storage.
    pub fn into_state(self) -> SyncState {
        self.state
    }

    pub(crate) fn household(&self) -> &A {
        &self.household
    }

    pub(crate) fn board(&self) -> &B {
        &self.board
    }

    pub(crate) fn rules(&self) -> &NameRules {
        &self.rules
    }

    pub(crate) fn state_mut(&mut self) -> &mut SyncState {
        &mut self.state
    }

    /// Runs the reconciler across all list pairs.
    ///
    /// `new_user` marks the one-time import boundary: household items
    /// unknown to the board are imported into it instead of purged.
    /// Returns the refreshed correspondence table.
    pub async fn run_full_sync(&mut self, new_user: bool) -> Result<&[SyncedList]> {
        let (household_lists, board_lists) = try_join!(
            fetch_household_lists(&self.household),
            provision::fetch_board_lists(&self.board),
        )?;

        let household_names: Vec<String> = household_lists.keys().cloned().collect();
        let board_lists = provision::ensure_board_lists(
            &self.board,
            board_lists,
            &household_names,
            &self.rules,
        )
        .await?;

        // One concurrent entry fetch per board list, joined up front.
        let board = &self.board;
        let entries: BTreeMap<&str, Vec<BoardEntry>> =
            try_join_all(board_lists.iter().map(|(name, handle)| async move {
                let entries = board.list_entries(handle.id, &handle.stage_field).await?;
                Ok::<_, SyncError>((name.as_str(), entries))
            }))
            .await?
            .into_iter()
            .collect();

        let board_names: Vec<&str> = board_lists.keys().map(String::as_str).collect();
        for (board_name, handle) in &board_lists {
            let Some(household_name) = self
                .rules
                .to_household_name(board_name, board_names.iter().copied())
            else {
                debug!(list = %board_name, "board list has no household mapping; skipping");
                continue;
            };
            let Some(snapshot) = household_lists.get(&household_name) else {
                debug!(list = %household_name, "no household list for mapped name; skipping");
                continue;
            };

            info!(household = %household_name, board = %board_name, "reconciling list pair");
            let synced = reconcile_list(
                &self.household,
                &self.board,
                ListPair {
                    household_list_id: &snapshot.list_id,
                    household_list_name: &household_name,
                    board_list_name: board_name,
                    handle,
                },
                &snapshot.items,
                &entries[board_name.as_str()],
                new_user,
            )
            .await?;
            self.state.upsert(synced);
        }

        Ok(self.state.lists())
    }
}

/// Fetches every active household list with its active and completed
/// items, all lists in parallel and both pages per list in parallel.
async fn fetch_household_lists<A: HouseholdListClient>(
    household: &A,
) -> Result<BTreeMap<String, HouseholdSnapshot>> {
    let metas = household.lists_metadata().await?;
    let snapshots = try_join_all(
        metas
            .into_iter()
            .filter(|meta| meta.state == ListState::Active)
            .map(|meta| async move {
                let (active, completed) = try_join!(
                    household.list(&meta.list_id, ItemStatus::Active),
                    household.list(&meta.list_id, ItemStatus::Completed),
                )?;
                let mut items = active.items;
                items.extend(completed.items);
                Ok::<_, SyncError>((
                    meta.name,
                    HouseholdSnapshot {
                        list_id: meta.list_id,
                        items,
                    },
                ))
            }),
    )
    .await?;
    Ok(snapshots.into_iter().collect())
}
