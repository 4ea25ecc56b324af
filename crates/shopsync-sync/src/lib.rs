//! Two-way product sync between the local catalog and a WooCommerce store.
//!
//! Outbound pushes are queued in the `sync_tasks` table and drained by the
//! worker pool in [`outbound`]; inbound pulls run on demand through
//! [`inbound::sync_from_remote`]. Field translation in both directions lives
//! in [`mapping`].

pub mod inbound;
pub mod mapping;
pub mod outbound;

use thiserror::Error;

pub use inbound::{sync_from_remote, SyncItemError, SyncReport};
pub use outbound::{process_next_task, spawn_workers, TaskOutcome, WorkerOptions};

/// Errors crossing the sync engine's boundary.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Db(#[from] shopsync_db::DbError),

    #[error(transparent)]
    Woo(#[from] shopsync_woo::WooError),
}
