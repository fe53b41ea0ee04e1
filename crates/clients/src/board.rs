//! Capability set of the board service (System B).
//!
//! The board service is the schema-rich side: lists live in workspaces and
//! carry *elements* (fields). Reconciliation needs the `Title` text field
//! and the `Stage` field with its `To-Do`/`Done` categories; resolving
//! those handles is the engine's job, this module only ships the raw shape.

use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(any(test, feature = "mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// A board workspace; new lists are provisioned into one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
}

/// Handle for an existing board list, keyed by name in [`BoardClient::lists`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardListInfo {
    pub id: i64,
    pub short_id: String,
    pub workspace_id: i64,
}

/// A freshly created board list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedList {
    pub id: i64,
    pub short_id: String,
    pub workspace_id: i64,
    pub name: String,
}

/// One schema element of a board list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub element_data: ElementData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementData {
    #[serde(default)]
    pub predefined_categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A board entry as returned by the entry listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntry {
    pub uuid: String,
    pub id: i64,
    pub display_text: String,
    pub completed: bool,
}

/// Identifiers of a newly added entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryHandle {
    pub uuid: String,
    pub id: i64,
}

/// Client for the board service.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait BoardClient: Send + Sync {
    /// The account's workspace, used when provisioning lists.
    async fn workspace(&self) -> Result<Workspace, ClientError>;

    /// All lists visible to the account, as an ordered name → handle map.
    async fn lists(&self) -> Result<BTreeMap<String, BoardListInfo>, ClientError>;

    /// Schema elements of one list.
    async fn elements(&self, short_id: &str) -> Result<Vec<Element>, ClientError>;

    /// Creates a list in the given workspace.
    async fn create_list(&self, name: &str, workspace_id: i64)
        -> Result<CreatedList, ClientError>;

    /// Entries of one list; the stage field uuid determines the
    /// crossed-off flag.
    async fn list_entries(
        &self,
        list_id: i64,
        stage_field: &str,
    ) -> Result<Vec<BoardEntry>, ClientError>;

    /// Adds an entry with the given title text.
    async fn add_entry(
        &self,
        list_id: i64,
        title_field: &str,
        text: &str,
    ) -> Result<EntryHandle, ClientError>;

    /// Renames an entry.
    async fn rename_entry(
        &self,
        list_id: i64,
        entry_id: i64,
        title_field: &str,
        text: &str,
    ) -> Result<(), ClientError>;

    /// Moves an entry into the given stage category.
    async fn set_entry_stage(
        &self,
        list_id: i64,
        entry_id: i64,
        stage_field: &str,
        category_id: i64,
    ) -> Result<(), ClientError>;

    /// Deletes an entry by uuid.
    async fn delete_entry(&self, list_id: i64, entry_uuid: &str) -> Result<(), ClientError>;
}
