//! Bidirectional reconciliation between two list services.
//!
//! The engine joins the *household* service (System A) and the *board*
//! service (System B) around an in-memory table of correspondence records.
//! Given both item collections plus the last known correspondence, it
//! decides which items to create, update or delete on each side so that
//! both converge to the same logical list state.
//!
//! Two entry points exist on [`SyncEngine`]:
//!
//! - [`SyncEngine::run_full_sync`] reconciles every list pair
//!   (cold start or periodic pass);
//! - [`SyncEngine::apply_event`] reacts to a single-list change
//!   notification from the household side.
//!
//! Convergence is best-effort eventual: a remote failure aborts the
//! current pass, and the next pass re-derives everything from both
//! remotes. The correspondence cache is owned by the engine, built per
//! account session, and never shared across concurrent passes.

#![deny(unsafe_code)]

pub mod error;
pub mod events;
pub mod mapping;
pub mod notify;
pub mod orchestrator;
pub mod provision;
pub mod reconcile;
pub mod state;

pub use error::{Result, SyncError};
pub use events::{EventKind, EventRequest};
pub use mapping::NameRules;
pub use notify::{NoticeOutcome, SYNC_BROKEN_NOTICE};
pub use orchestrator::SyncEngine;
pub use provision::BoardListHandle;
pub use state::{SyncState, SyncedItem, SyncedList};
