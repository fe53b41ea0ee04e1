//! Board-side list discovery and lazy provisioning.
//!
//! Every household list must have a board counterpart before items can be
//! reconciled. Discovery resolves each board list's schema handles up
//! front; provisioning creates whatever the name mapper says is missing,
//! sharing a single workspace lookup per pass.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use tracing::info;
use twinlist_clients::{BoardClient, Element};

use crate::error::{Result, SyncError};
use crate::mapping::NameRules;

const TITLE_ELEMENT: &str = "Title";
const STAGE_ELEMENT: &str = "Stage";
const TODO_CATEGORY: &str = "To-Do";
const DONE_CATEGORY: &str = "Done";

/// A board list with its schema handles resolved, ready for item writes.
#[derive(Debug, Clone)]
pub struct BoardListHandle {
    pub id: i64,
    pub short_id: String,
    pub workspace_id: i64,
    pub title_field: String,
    pub stage_field: String,
    pub complete_category: i64,
    pub incomplete_category: i64,
}

/// Extracts the title/stage handles from a list's raw schema.
///
/// A missing element or category is a configuration error for that list;
/// it is surfaced, never retried.
pub(crate) fn resolve_schema(
    list_name: &str,
    short_id: &str,
    id: i64,
    workspace_id: i64,
    elements: &[Element],
) -> Result<BoardListHandle> {
    let missing = |element: &str| SyncError::MissingSchema {
        list: list_name.to_string(),
        element: element.to_string(),
    };

    let title = elements
        .iter()
        .find(|e| e.name == TITLE_ELEMENT)
        .ok_or_else(|| missing(TITLE_ELEMENT))?;
    let stage = elements
        .iter()
        .find(|e| e.name == STAGE_ELEMENT)
        .ok_or_else(|| missing(STAGE_ELEMENT))?;

    let category = |name: &str| {
        stage
            .element_data
            .predefined_categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| missing(name))
    };

    Ok(BoardListHandle {
        id,
        short_id: short_id.to_string(),
        workspace_id,
        title_field: title.uuid.clone(),
        stage_field: stage.uuid.clone(),
        complete_category: category(DONE_CATEGORY)?,
        incomplete_category: category(TODO_CATEGORY)?,
    })
}

/// Fetches all board lists and resolves their schema handles, keeping the
/// name → handle mapping ordered.
pub(crate) async fn fetch_board_lists<B: BoardClient>(
    board: &B,
) -> Result<BTreeMap<String, BoardListHandle>> {
    let lists = board.lists().await?;
    let resolved = try_join_all(lists.into_iter().map(|(name, info)| async move {
        let elements = board.elements(&info.short_id).await?;
        let handle =
            resolve_schema(&name, &info.short_id, info.id, info.workspace_id, &elements)?;
        Ok::<_, SyncError>((name, handle))
    }))
    .await?;
    Ok(resolved.into_iter().collect())
}

/// Makes sure every household list has a board counterpart.
///
/// Missing lists are created concurrently in one workspace; the workspace
/// is looked up once, only when something actually needs creating. When
/// nothing is missing the input map is returned untouched with zero extra
/// remote calls; otherwise the full list set is re-fetched so the new
/// lists come back with resolved schema handles.
pub(crate) async fn ensure_board_lists<B: BoardClient>(
    board: &B,
    board_lists: BTreeMap<String, BoardListHandle>,
    household_names: &[String],
    rules: &NameRules,
) -> Result<BTreeMap<String, BoardListHandle>> {
    let known: Vec<&str> = board_lists.keys().map(String::as_str).collect();
    let mut missing: Vec<String> = Vec::new();
    for name in household_names {
        let mapped = rules.to_board_name(name, known.iter().copied());
        if !board_lists.contains_key(&mapped) && !missing.contains(&mapped) {
            missing.push(mapped);
        }
    }

    if missing.is_empty() {
        return Ok(board_lists);
    }

    let workspace = board.workspace().await?;
    try_join_all(missing.iter().map(|name| {
        info!(name = %name, "creating missing board list");
        board.create_list(name, workspace.id)
    }))
    .await?;

    fetch_board_lists(board).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinlist_clients::MockBoardClient;
    use twinlist_test_utils::{default_elements, FakeBoard, WORKSPACE_ID};

    #[test]
    fn resolve_schema_extracts_handles() {
        let elements = default_elements(7);
        let handle = resolve_schema("Chores", "bs-7", 7, WORKSPACE_ID, &elements).unwrap();
        assert_eq!(handle.title_field, "title-7");
        assert_eq!(handle.stage_field, "stage-7");
        assert_eq!(handle.complete_category, 2);
        assert_eq!(handle.incomplete_category, 1);
    }

    #[test]
    fn resolve_schema_reports_missing_stage() {
        let mut elements = default_elements(7);
        elements.retain(|e| e.name != "Stage");
        let err = resolve_schema("Chores", "bs-7", 7, WORKSPACE_ID, &elements).unwrap_err();
        match err {
            SyncError::MissingSchema { list, element } => {
                assert_eq!(list, "Chores");
                assert_eq!(element, "Stage");
            }
            other => panic!("expected MissingSchema, got {other:?}"),
        }
    }

    #[test]
    fn resolve_schema_reports_missing_done_category() {
        let mut elements = default_elements(7);
        for e in &mut elements {
            e.element_data
                .predefined_categories
                .retain(|c| c.name != "Done");
        }
        let err = resolve_schema("Chores", "bs-7", 7, WORKSPACE_ID, &elements).unwrap_err();
        assert!(matches!(
            err,
            SyncError::MissingSchema { element, .. } if element == "Done"
        ));
    }

    #[tokio::test]
    async fn nothing_missing_means_no_remote_calls() {
        // The mock has no expectations set, so any call would panic.
        let board = MockBoardClient::new();
        let fake = FakeBoard::new();
        fake.add_list("Chores");
        let current = fetch_board_lists(&fake).await.unwrap();

        let result = ensure_board_lists(
            &board,
            current.clone(),
            &["Chores".to_string()],
            &NameRules::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.len(), current.len());
    }

    #[tokio::test]
    async fn missing_list_is_created_with_one_workspace_lookup() {
        let board = FakeBoard::new();
        board.add_list("Inbox");
        let current = fetch_board_lists(&board).await.unwrap();

        let result = ensure_board_lists(
            &board,
            current,
            &["Chores".to_string(), "Errands".to_string()],
            &NameRules::default(),
        )
        .await
        .unwrap();

        assert_eq!(board.workspace_calls(), 1);
        assert!(result.contains_key("Chores"));
        assert!(result.contains_key("Errands"));
        assert!(result.contains_key("Inbox"));
    }

    #[tokio::test]
    async fn household_todo_is_not_duplicated_when_inbox_exists() {
        let board = FakeBoard::new();
        board.add_list("Inbox");
        let current = fetch_board_lists(&board).await.unwrap();

        let result = ensure_board_lists(
            &board,
            current,
            &["To-Do List".to_string()],
            &NameRules::default(),
        )
        .await
        .unwrap();

        // The to-do name maps onto the existing inbox, so nothing is created.
        assert_eq!(board.write_count(), 0);
        assert_eq!(result.len(), 1);
    }
}
