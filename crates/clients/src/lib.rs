//! Remote service contracts for twinlist.
//!
//! Two independently-owned list services take part in reconciliation:
//! the *household* service (flat voice-assistant lists) and the *board*
//! service (collaborative lists with a field/category schema). This crate
//! defines their capability sets as async traits, the domain types shared
//! with the engine, and a thin HTTP implementation of the board client.
//!
//! Enable the `mocks` feature to get `mockall`-generated mocks of both
//! traits for use in downstream tests.

#![deny(unsafe_code)]

pub mod board;
pub mod board_http;
pub mod config;
pub mod error;
pub mod household;

pub use board::{
    BoardClient, BoardEntry, BoardListInfo, Category, CreatedList, Element, ElementData,
    EntryHandle, Workspace,
};
pub use board_http::HttpBoardClient;
pub use config::ApiConfig;
pub use error::ClientError;
pub use household::{
    HouseholdItem, HouseholdItemUpdate, HouseholdListClient, HouseholdListInfo, HouseholdListPage,
    ItemStatus, ListState, NewHouseholdItem,
};

#[cfg(any(test, feature = "mocks"))]
pub use board::MockBoardClient;
#[cfg(any(test, feature = "mocks"))]
pub use household::MockHouseholdListClient;
