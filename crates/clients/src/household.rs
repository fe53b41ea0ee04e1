//! Capability set of the household list service (System A).
//!
//! The household service hands out flat lists of items carrying a value,
//! a completion status, the last-updated timestamp and an opaque version
//! token. The engine treats its clock as the source of truth for
//! last-write-wins decisions.

use async_trait::async_trait;
#[cfg(any(test, feature = "mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ClientError;

/// Completion status of a list item, shared by both services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Completed,
}

impl ItemStatus {
    /// Derives a status from the board service's crossed-off flag.
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// Lifecycle state of a household list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListState {
    Active,
    Archived,
}

/// One entry from the household list-metadata endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdListInfo {
    pub list_id: String,
    pub name: String,
    pub state: ListState,
}

/// A single household item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdItem {
    pub id: String,
    pub value: String,
    pub status: ItemStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_time: OffsetDateTime,
    /// Opaque concurrency token; must be echoed back on updates.
    pub version: i64,
}

/// One page of a household list, filtered by item status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdListPage {
    pub list_id: String,
    pub name: String,
    pub items: Vec<HouseholdItem>,
}

/// Payload for creating a household item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHouseholdItem {
    pub value: String,
    pub status: ItemStatus,
}

/// Payload for updating a household item in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdItemUpdate {
    pub value: String,
    pub status: ItemStatus,
    pub version: i64,
}

/// Client for the household list service.
///
/// Retry and timeout policy live behind this trait; the engine treats a
/// failed call as fatal for the current pass.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait HouseholdListClient: Send + Sync {
    /// Metadata for every list on the account.
    async fn lists_metadata(&self) -> Result<Vec<HouseholdListInfo>, ClientError>;

    /// One list with its items filtered by status.
    async fn list(&self, list_id: &str, status: ItemStatus)
        -> Result<HouseholdListPage, ClientError>;

    /// A single item by id.
    async fn item(&self, list_id: &str, item_id: &str) -> Result<HouseholdItem, ClientError>;

    /// Creates an item and returns it with server-assigned fields.
    async fn create_item(
        &self,
        list_id: &str,
        item: NewHouseholdItem,
    ) -> Result<HouseholdItem, ClientError>;

    /// Updates an item; the update must carry the current version token.
    async fn update_item(
        &self,
        list_id: &str,
        item_id: &str,
        update: HouseholdItemUpdate,
    ) -> Result<HouseholdItem, ClientError>;

    /// Deletes an item.
    async fn delete_item(&self, list_id: &str, item_id: &str) -> Result<(), ClientError>;
}
