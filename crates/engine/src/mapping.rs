//! List-name mapping between the two services' vocabularies.
//!
//! A user's single "to-do" concept on the household side can be satisfied
//! by either a dedicated to-do list or the inbox fallback on the board
//! side. The reverse rules make sure the inbox only claims the to-do name
//! while no dedicated to-do list exists, so one household list is never
//! reconciled against two board lists at once.

use serde::{Deserialize, Serialize};

/// Canonical list names and keywords used by the mapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRules {
    /// Household-side shopping list name.
    pub household_shopping: String,
    /// Household-side to-do list name.
    pub household_todo: String,
    /// Board-side shopping list name.
    pub board_shopping: String,
    /// Keyword that marks a board list as a to-do list (matched
    /// case-insensitively as a substring).
    pub board_todo_keyword: String,
    /// Board-side inbox/catch-all list name.
    pub board_inbox: String,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            household_shopping: "Shopping List".to_string(),
            household_todo: "To-Do List".to_string(),
            board_shopping: "Shopping List".to_string(),
            board_todo_keyword: "to-do".to_string(),
            board_inbox: "Inbox".to_string(),
        }
    }
}

impl NameRules {
    fn contains_keyword(&self, name: &str) -> bool {
        name.to_lowercase()
            .contains(&self.board_todo_keyword.to_lowercase())
    }

    fn any_todo_list<'a>(&self, board_names: impl IntoIterator<Item = &'a str>) -> Option<String> {
        board_names
            .into_iter()
            .find(|n| self.contains_keyword(n))
            .map(str::to_string)
    }

    /// Maps a household list name to its board counterpart.
    ///
    /// The to-do name resolves to an existing keyword-bearing board list
    /// when one exists, else to the inbox. Everything that is not a
    /// canonical name passes through unchanged.
    pub fn to_board_name<'a>(
        &self,
        name: &str,
        board_names: impl IntoIterator<Item = &'a str>,
    ) -> String {
        if name == self.household_shopping {
            self.board_shopping.clone()
        } else if name == self.household_todo {
            self.any_todo_list(board_names)
                .unwrap_or_else(|| self.board_inbox.clone())
        } else {
            name.to_string()
        }
    }

    /// Maps a board list name back to its household counterpart.
    ///
    /// Returns `None` when the board list should be ignored: the inbox
    /// yields the to-do name only while no keyword-bearing board list
    /// exists, otherwise mapping it too would reconcile the household
    /// to-do list against two board lists.
    pub fn to_household_name<'a>(
        &self,
        name: &str,
        board_names: impl IntoIterator<Item = &'a str>,
    ) -> Option<String> {
        if name == self.board_shopping {
            Some(self.household_shopping.clone())
        } else if self.contains_keyword(name) {
            Some(self.household_todo.clone())
        } else if name == self.board_inbox {
            if self.any_todo_list(board_names).is_some() {
                None
            } else {
                Some(self.household_todo.clone())
            }
        } else {
            Some(name.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> NameRules {
        NameRules {
            household_shopping: "Household shopping list".to_string(),
            household_todo: "Household to-do list".to_string(),
            board_shopping: "Shopping List".to_string(),
            board_todo_keyword: "to-do".to_string(),
            board_inbox: "Inbox".to_string(),
        }
    }

    #[test]
    fn shopping_maps_both_directions() {
        let r = rules();
        assert_eq!(
            r.to_board_name("Household shopping list", []),
            "Shopping List"
        );
        assert_eq!(
            r.to_household_name("Shopping List", []),
            Some("Household shopping list".to_string())
        );
    }

    #[test]
    fn todo_prefers_keyword_list_over_inbox() {
        let r = rules();
        let names = ["Inbox", "My To-Do Board"];
        assert_eq!(
            r.to_board_name("Household to-do list", names),
            "My To-Do Board"
        );
    }

    #[test]
    fn todo_falls_back_to_inbox() {
        let r = rules();
        assert_eq!(r.to_board_name("Household to-do list", ["Inbox"]), "Inbox");
    }

    #[test]
    fn keyword_list_maps_to_household_todo() {
        let r = rules();
        assert_eq!(
            r.to_household_name("weekly TO-DO items", []),
            Some("Household to-do list".to_string())
        );
    }

    #[test]
    fn inbox_maps_to_todo_only_without_keyword_list() {
        let r = rules();
        assert_eq!(
            r.to_household_name("Inbox", ["Inbox", "Groceries"]),
            Some("Household to-do list".to_string())
        );
        // A dedicated to-do list exists: the inbox must be ignored.
        assert_eq!(r.to_household_name("Inbox", ["Inbox", "My to-do list"]), None);
    }

    #[test]
    fn other_names_pass_through() {
        let r = rules();
        assert_eq!(r.to_board_name("Chores", []), "Chores");
        assert_eq!(
            r.to_household_name("Chores", []),
            Some("Chores".to_string())
        );
    }

    #[test]
    fn round_trip_for_non_inbox_names() {
        let r = rules();
        for name in ["Shopping List", "Chores", "house TO-DO"] {
            let household = r.to_household_name(name, []).unwrap();
            assert_eq!(r.to_board_name(&household, [name]), name);
        }
    }
}
