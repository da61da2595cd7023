//! Domain types of the mailbox watcher.
//!
//! Everything here is plain data: account descriptors supplied by the
//! configuration layer, the per-account state record owned by a supervisor
//! task, and the status events that record emits.

mod account;
mod error_code;
mod event;
mod message_id;
mod password;
mod state;
mod unseen;

pub use account::*;
pub use error_code::*;
pub use event::*;
pub use message_id::*;
pub use password::*;
pub use state::*;
pub use unseen::*;
