//! Ledger engine: customers, accounts, transfers and their supporting indexes.
mod account;
mod auth;
mod balance_index;
mod config;
mod error;
mod heap;
mod ledger;
mod queue;
mod snapshot;
mod state;
mod store;
mod transaction;
mod types;

pub use account::*;
pub use auth::*;
pub use balance_index::*;
pub use config::*;
pub use error::*;
pub use heap::*;
pub use ledger::*;
pub use queue::{FifoQueue, Iter as QueueIter};
pub use snapshot::*;
pub use state::*;
pub use store::*;
pub use transaction::*;
pub use types::*;
