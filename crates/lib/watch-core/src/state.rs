//! Per-account state record.

use std::collections::BTreeSet;

use crate::{ErrorCode, MessageId, StatusEvent, UnseenSet};

/// Where an account is in its connection lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ConnectionState {
    /// Not connected, or waiting to reconnect.
    #[default]
    Disconnected,

    /// Opening the transport.
    Connecting,

    /// Presenting credentials.
    Authenticating,

    /// Selecting the watched folder.
    FolderSelecting,

    /// Waiting for server pushes.
    Idling,

    /// Re-reading the unseen set.
    Refreshing,

    /// Stopped after a permanent failure.
    Failed,
}

/// The state one account supervisor owns.
///
/// Only the owning task mutates it. Other tasks learn about it exclusively
/// through the [`StatusEvent`]s built by [`AccountState::event`], which copy
/// the count and the error out of the same record in one go.
#[derive(Clone, Debug, Default)]
pub struct AccountState {
    /// Current lifecycle position.
    connection: ConnectionState,

    /// Current error code.
    error: ErrorCode,

    /// Last unseen snapshot.
    unseen: UnseenSet,
}

impl AccountState {
    /// Current lifecycle position.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Current error code.
    pub fn error(&self) -> ErrorCode {
        self.error
    }

    /// Last unseen snapshot.
    pub fn unseen(&self) -> &UnseenSet {
        &self.unseen
    }

    /// Move to another lifecycle position.
    pub fn enter(&mut self, connection: ConnectionState) {
        self.connection = connection;
    }

    /// Record a failure. Permanent failures park the account in
    /// [`ConnectionState::Failed`].
    pub fn record_failure(&mut self, error: ErrorCode) {
        self.error = error;
        self.connection = if error.is_permanent() {
            ConnectionState::Failed
        } else {
            ConnectionState::Disconnected
        };
    }

    /// Clear the error code, returning whether it changed.
    pub fn clear_error(&mut self) -> bool {
        let changed = self.error.is_error();
        self.error = ErrorCode::None;
        changed
    }

    /// Replace the unseen snapshot wholesale.
    pub fn replace_unseen(&mut self, current: BTreeSet<MessageId>) {
        self.unseen = UnseenSet::from(current);
    }

    /// Build the status event describing this record.
    pub fn event(&self, account: &str, new_subjects: Vec<String>) -> StatusEvent {
        StatusEvent {
            account: account.to_owned(),
            state: self.connection,
            error: self.error,
            unseen: self.unseen.len(),
            new_subjects,
        }
    }
}
