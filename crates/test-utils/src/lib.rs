//! Shared test fixtures for twinlist crates.
//!
//! Provides stateful in-memory implementations of both remote clients.
//! Every mutating call bumps a write counter, which lets tests assert
//! convergence properties like "a second sync pass issues zero remote
//! writes" without inspecting call logs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use twinlist_clients::{
    BoardClient, BoardEntry, BoardListInfo, Category, ClientError, CreatedList, Element,
    ElementData, EntryHandle, HouseholdItem, HouseholdItemUpdate, HouseholdListClient,
    HouseholdListInfo, HouseholdListPage, ItemStatus, ListState, NewHouseholdItem, Workspace,
};

/// Stage category ids used by every fake board list.
pub const TODO_CATEGORY: i64 = 1;
pub const DONE_CATEGORY: i64 = 2;

/// Workspace id reported by [`FakeBoard::workspace`].
pub const WORKSPACE_ID: i64 = 100;

/// Deterministic timestamp helper: a fixed epoch plus `secs`.
pub fn ts(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000 + secs).expect("valid timestamp")
}

fn not_found(what: &str, id: &str) -> ClientError {
    ClientError::Api {
        status: 404,
        message: format!("{what} '{id}' not found"),
    }
}

// ---------------------------------------------------------------------------
// Environment helpers
// ---------------------------------------------------------------------------

/// Serializes tests that mutate process-global state (environment variables).
///
/// Acquire this at the start of any test that touches env vars so parallel
/// tests cannot race each other.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for one environment variable; restores the original value on
/// drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Sets an environment variable (or removes it with `None`) and returns a
/// guard that restores the previous value on drop.
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

// ---------------------------------------------------------------------------
// Household fake
// ---------------------------------------------------------------------------

struct FakeHouseholdList {
    info: HouseholdListInfo,
    items: Vec<HouseholdItem>,
}

#[derive(Default)]
struct HouseholdInner {
    lists: Mutex<Vec<FakeHouseholdList>>,
    writes: AtomicUsize,
    next_id: AtomicI64,
    failing_updates: Mutex<Vec<String>>,
}

/// In-memory household list service. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct FakeHousehold {
    inner: Arc<HouseholdInner>,
}

impl FakeHousehold {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> i64 {
        self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Registers a list and returns its id.
    pub fn add_list(&self, name: &str) -> String {
        self.add_list_in_state(name, ListState::Active)
    }

    pub fn add_list_in_state(&self, name: &str, state: ListState) -> String {
        let list_id = format!("hl-{}", self.next());
        self.inner.lists.lock().unwrap().push(FakeHouseholdList {
            info: HouseholdListInfo {
                list_id: list_id.clone(),
                name: name.to_string(),
                state,
            },
            items: Vec::new(),
        });
        list_id
    }

    /// Inserts an item directly (no write counted) with a generated timestamp.
    pub fn push_item(&self, list_id: &str, value: &str, status: ItemStatus) -> HouseholdItem {
        let n = self.next();
        self.push_item_at(list_id, value, status, ts(n))
    }

    /// Inserts an item directly with an explicit timestamp.
    pub fn push_item_at(
        &self,
        list_id: &str,
        value: &str,
        status: ItemStatus,
        updated_time: OffsetDateTime,
    ) -> HouseholdItem {
        let item = HouseholdItem {
            id: format!("hi-{}", self.next()),
            value: value.to_string(),
            status,
            updated_time,
            version: 1,
        };
        let mut lists = self.inner.lists.lock().unwrap();
        let list = lists
            .iter_mut()
            .find(|l| l.info.list_id == list_id)
            .expect("unknown fake household list");
        list.items.push(item.clone());
        item
    }

    /// Rewrites an item in place without counting a write, simulating an
    /// out-of-band edit made directly in the household app.
    pub fn set_item(
        &self,
        list_id: &str,
        item_id: &str,
        value: &str,
        status: ItemStatus,
        updated_time: OffsetDateTime,
    ) {
        let mut lists = self.inner.lists.lock().unwrap();
        let item = lists
            .iter_mut()
            .find(|l| l.info.list_id == list_id)
            .and_then(|l| l.items.iter_mut().find(|i| i.id == item_id))
            .expect("unknown fake household item");
        item.value = value.to_string();
        item.status = status;
        item.updated_time = updated_time;
        item.version += 1;
    }

    /// Current items of a list, in insertion order.
    pub fn items(&self, list_id: &str) -> Vec<HouseholdItem> {
        let lists = self.inner.lists.lock().unwrap();
        lists
            .iter()
            .find(|l| l.info.list_id == list_id)
            .map(|l| l.items.clone())
            .unwrap_or_default()
    }

    /// Number of create/update/delete calls observed so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Makes every `update_item` call for this item fail with a 500,
    /// simulating a remote fault in the middle of a write batch.
    pub fn fail_update_for(&self, item_id: &str) {
        self.inner
            .failing_updates
            .lock()
            .unwrap()
            .push(item_id.to_string());
    }
}

#[async_trait]
impl HouseholdListClient for FakeHousehold {
    async fn lists_metadata(&self) -> Result<Vec<HouseholdListInfo>, ClientError> {
        let lists = self.inner.lists.lock().unwrap();
        Ok(lists.iter().map(|l| l.info.clone()).collect())
    }

    async fn list(
        &self,
        list_id: &str,
        status: ItemStatus,
    ) -> Result<HouseholdListPage, ClientError> {
        let lists = self.inner.lists.lock().unwrap();
        let list = lists
            .iter()
            .find(|l| l.info.list_id == list_id)
            .ok_or_else(|| not_found("list", list_id))?;
        Ok(HouseholdListPage {
            list_id: list.info.list_id.clone(),
            name: list.info.name.clone(),
            items: list
                .items
                .iter()
                .filter(|i| i.status == status)
                .cloned()
                .collect(),
        })
    }

    async fn item(&self, list_id: &str, item_id: &str) -> Result<HouseholdItem, ClientError> {
        let lists = self.inner.lists.lock().unwrap();
        lists
            .iter()
            .find(|l| l.info.list_id == list_id)
            .and_then(|l| l.items.iter().find(|i| i.id == item_id))
            .cloned()
            .ok_or_else(|| not_found("item", item_id))
    }

    async fn create_item(
        &self,
        list_id: &str,
        item: NewHouseholdItem,
    ) -> Result<HouseholdItem, ClientError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let n = self.next();
        let created = HouseholdItem {
            id: format!("hi-{n}"),
            value: item.value,
            status: item.status,
            updated_time: ts(n),
            version: 1,
        };
        let mut lists = self.inner.lists.lock().unwrap();
        let list = lists
            .iter_mut()
            .find(|l| l.info.list_id == list_id)
            .ok_or_else(|| not_found("list", list_id))?;
        list.items.push(created.clone());
        Ok(created)
    }

    async fn update_item(
        &self,
        list_id: &str,
        item_id: &str,
        update: HouseholdItemUpdate,
    ) -> Result<HouseholdItem, ClientError> {
        if self
            .inner
            .failing_updates
            .lock()
            .unwrap()
            .iter()
            .any(|id| id == item_id)
        {
            return Err(ClientError::Api {
                status: 500,
                message: format!("update of '{item_id}' failed"),
            });
        }
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let stamp = ts(self.next());
        let mut lists = self.inner.lists.lock().unwrap();
        let item = lists
            .iter_mut()
            .find(|l| l.info.list_id == list_id)
            .and_then(|l| l.items.iter_mut().find(|i| i.id == item_id))
            .ok_or_else(|| not_found("item", item_id))?;
        item.value = update.value;
        item.status = update.status;
        item.version = update.version + 1;
        item.updated_time = stamp;
        Ok(item.clone())
    }

    async fn delete_item(&self, list_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let mut lists = self.inner.lists.lock().unwrap();
        let list = lists
            .iter_mut()
            .find(|l| l.info.list_id == list_id)
            .ok_or_else(|| not_found("list", list_id))?;
        let before = list.items.len();
        list.items.retain(|i| i.id != item_id);
        if list.items.len() == before {
            return Err(not_found("item", item_id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Board fake
// ---------------------------------------------------------------------------

struct FakeBoardList {
    name: String,
    id: i64,
    short_id: String,
    workspace_id: i64,
    entries: Vec<BoardEntry>,
    elements: Vec<Element>,
}

#[derive(Default)]
struct BoardInner {
    lists: Mutex<Vec<FakeBoardList>>,
    writes: AtomicUsize,
    workspace_calls: AtomicUsize,
    next_id: AtomicI64,
}

/// In-memory board service. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct FakeBoard {
    inner: Arc<BoardInner>,
}

/// The standard schema every provisioned fake list gets: a `Title` text
/// field and a `Stage` field with `To-Do`/`Done` categories.
pub fn default_elements(list_id: i64) -> Vec<Element> {
    vec![
        Element {
            uuid: format!("title-{list_id}"),
            name: "Title".to_string(),
            element_data: ElementData::default(),
        },
        Element {
            uuid: format!("stage-{list_id}"),
            name: "Stage".to_string(),
            element_data: ElementData {
                predefined_categories: vec![
                    Category {
                        id: TODO_CATEGORY,
                        name: "To-Do".to_string(),
                    },
                    Category {
                        id: DONE_CATEGORY,
                        name: "Done".to_string(),
                    },
                ],
            },
        },
    ]
}

impl FakeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> i64 {
        self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Registers a list with the standard schema and returns its id.
    pub fn add_list(&self, name: &str) -> i64 {
        let id = self.next();
        self.add_list_with_elements(name, default_elements(id), id)
    }

    /// Registers a list with a custom schema, for configuration-error tests.
    pub fn add_broken_list(&self, name: &str, elements: Vec<Element>) -> i64 {
        let id = self.next();
        self.add_list_with_elements(name, elements, id)
    }

    fn add_list_with_elements(&self, name: &str, elements: Vec<Element>, id: i64) -> i64 {
        self.inner.lists.lock().unwrap().push(FakeBoardList {
            name: name.to_string(),
            id,
            short_id: format!("bs-{id}"),
            workspace_id: WORKSPACE_ID,
            entries: Vec::new(),
            elements,
        });
        id
    }

    /// Inserts an entry directly (no write counted).
    pub fn push_entry(&self, list_id: i64, text: &str, completed: bool) -> BoardEntry {
        let entry = BoardEntry {
            uuid: format!("bu-{}", self.next()),
            id: self.next(),
            display_text: text.to_string(),
            completed,
        };
        let mut lists = self.inner.lists.lock().unwrap();
        let list = lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .expect("unknown fake board list");
        list.entries.push(entry.clone());
        entry
    }

    /// Current entries of a list, in insertion order.
    pub fn entries(&self, list_id: i64) -> Vec<BoardEntry> {
        let lists = self.inner.lists.lock().unwrap();
        lists
            .iter()
            .find(|l| l.id == list_id)
            .map(|l| l.entries.clone())
            .unwrap_or_default()
    }

    /// Id of the list with the given name, if present.
    pub fn list_id(&self, name: &str) -> Option<i64> {
        let lists = self.inner.lists.lock().unwrap();
        lists.iter().find(|l| l.name == name).map(|l| l.id)
    }

    /// Number of mutating calls (list creates, entry writes) so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Number of workspace lookups so far.
    pub fn workspace_calls(&self) -> usize {
        self.inner.workspace_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BoardClient for FakeBoard {
    async fn workspace(&self) -> Result<Workspace, ClientError> {
        self.inner.workspace_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Workspace { id: WORKSPACE_ID })
    }

    async fn lists(&self) -> Result<BTreeMap<String, BoardListInfo>, ClientError> {
        let lists = self.inner.lists.lock().unwrap();
        Ok(lists
            .iter()
            .map(|l| {
                (
                    l.name.clone(),
                    BoardListInfo {
                        id: l.id,
                        short_id: l.short_id.clone(),
                        workspace_id: l.workspace_id,
                    },
                )
            })
            .collect())
    }

    async fn elements(&self, short_id: &str) -> Result<Vec<Element>, ClientError> {
        let lists = self.inner.lists.lock().unwrap();
        lists
            .iter()
            .find(|l| l.short_id == short_id)
            .map(|l| l.elements.clone())
            .ok_or_else(|| not_found("list", short_id))
    }

    async fn create_list(
        &self,
        name: &str,
        workspace_id: i64,
    ) -> Result<CreatedList, ClientError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let id = self.next();
        let short_id = format!("bs-{id}");
        self.inner.lists.lock().unwrap().push(FakeBoardList {
            name: name.to_string(),
            id,
            short_id: short_id.clone(),
            workspace_id,
            entries: Vec::new(),
            elements: default_elements(id),
        });
        Ok(CreatedList {
            id,
            short_id,
            workspace_id,
            name: name.to_string(),
        })
    }

    async fn list_entries(
        &self,
        list_id: i64,
        _stage_field: &str,
    ) -> Result<Vec<BoardEntry>, ClientError> {
        let lists = self.inner.lists.lock().unwrap();
        lists
            .iter()
            .find(|l| l.id == list_id)
            .map(|l| l.entries.clone())
            .ok_or_else(|| not_found("list", &list_id.to_string()))
    }

    async fn add_entry(
        &self,
        list_id: i64,
        _title_field: &str,
        text: &str,
    ) -> Result<EntryHandle, ClientError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let entry = BoardEntry {
            uuid: format!("bu-{}", self.next()),
            id: self.next(),
            display_text: text.to_string(),
            completed: false,
        };
        let handle = EntryHandle {
            uuid: entry.uuid.clone(),
            id: entry.id,
        };
        let mut lists = self.inner.lists.lock().unwrap();
        let list = lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| not_found("list", &list_id.to_string()))?;
        list.entries.push(entry);
        Ok(handle)
    }

    async fn rename_entry(
        &self,
        list_id: i64,
        entry_id: i64,
        _title_field: &str,
        text: &str,
    ) -> Result<(), ClientError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let mut lists = self.inner.lists.lock().unwrap();
        let entry = lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .and_then(|l| l.entries.iter_mut().find(|e| e.id == entry_id))
            .ok_or_else(|| not_found("entry", &entry_id.to_string()))?;
        entry.display_text = text.to_string();
        Ok(())
    }

    async fn set_entry_stage(
        &self,
        list_id: i64,
        entry_id: i64,
        _stage_field: &str,
        category_id: i64,
    ) -> Result<(), ClientError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let mut lists = self.inner.lists.lock().unwrap();
        let entry = lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .and_then(|l| l.entries.iter_mut().find(|e| e.id == entry_id))
            .ok_or_else(|| not_found("entry", &entry_id.to_string()))?;
        entry.completed = category_id == DONE_CATEGORY;
        Ok(())
    }

    async fn delete_entry(&self, list_id: i64, entry_uuid: &str) -> Result<(), ClientError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        let mut lists = self.inner.lists.lock().unwrap();
        let list = lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| not_found("list", &list_id.to_string()))?;
        let before = list.entries.len();
        list.entries.retain(|e| e.uuid != entry_uuid);
        if list.entries.len() == before {
            return Err(not_found("entry", entry_uuid));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_env_var_sets_and_restores() {
        let _env = env_guard();
        const KEY: &str = "TWINLIST_TEST_UTILS_SET_VAR";
        std::env::remove_var(KEY);

        {
            let _guard = set_env_var(KEY, Some("value"));
            assert_eq!(std::env::var(KEY).ok(), Some("value".to_string()));
        }
        assert!(std::env::var(KEY).is_err());
    }

    #[test]
    fn set_env_var_restores_previous_value() {
        let _env = env_guard();
        const KEY: &str = "TWINLIST_TEST_UTILS_RESTORE_VAR";
        std::env::set_var(KEY, "original");

        {
            let _guard = set_env_var(KEY, None);
            assert!(std::env::var(KEY).is_err());
        }
        assert_eq!(std::env::var(KEY).ok(), Some("original".to_string()));

        std::env::remove_var(KEY);
    }
}
