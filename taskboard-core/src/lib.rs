/// Task board model, codecs and reconciliation.
///
/// A board is three working columns (todo, in-progress, done) plus an
/// optional hidden `deleted` column for soft-deleted tickets. Boards are
/// stored as `.json` or `.csv` files; `reconcile` holds the pure mutation
/// operations and `session` ties them to a file on disk.
pub mod codec;
pub mod config;
pub mod error;
pub mod position;
pub mod protocol;
pub mod reconcile;
pub mod session;
pub mod storage;
pub mod ticket;
pub mod types;
pub mod watcher;

pub use error::BoardError;
pub use types::{Board, Column, Status, Ticket};
