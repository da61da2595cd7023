//! Status board.
//!
//! Folds the status events of all accounts into one view. A single
//! aggregator task owns the board and applies every event in one step, then
//! publishes the result through a [`tokio::sync::watch`] channel, so readers
//! never observe a half-applied event.

use watch_core::{ConnectionState, ErrorCode, StatusEvent};

mod aggregator;
mod new_mail;

pub use aggregator::*;
pub use new_mail::*;

/// The last known status of one account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountStatus {
    /// Account name.
    pub name: String,

    /// Connection state from the last event.
    pub state: ConnectionState,

    /// Error code from the last event.
    pub error: ErrorCode,

    /// Unseen count from the last event.
    pub unseen: usize,

    /// Whether any event was received for this account yet.
    pub reported: bool,
}

impl AccountStatus {
    /// An account nothing is known about yet.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ConnectionState::Disconnected,
            error: ErrorCode::None,
            unseen: 0,
            reported: false,
        }
    }

    /// One summary line for this account, if there is anything to say.
    pub fn summary_line(&self) -> Option<String> {
        if self.error.is_error() {
            return Some(format!("{}: {}", self.name, self.error.description()));
        }
        if !self.reported {
            return None;
        }

        let count = match self.unseen {
            0 => "No new messages".to_owned(),
            1 => "One new message".to_owned(),
            n => format!("{n} new messages"),
        };
        Some(format!("{}: {count}", self.name))
    }
}

/// What an icon should show.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Indicator {
    /// No account has reported yet.
    Disconnected,

    /// Nothing unseen.
    NoMail,

    /// Exactly one unseen message.
    OneMessage,

    /// More than one unseen message.
    ManyMessages,
}

/// The aggregated view over all accounts, in registration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Board {
    /// Account statuses.
    accounts: Vec<AccountStatus>,
}

impl Board {
    /// A board listing `names`, none of which has reported yet.
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            accounts: names.into_iter().map(AccountStatus::pending).collect(),
        }
    }

    /// All account statuses.
    pub fn accounts(&self) -> &[AccountStatus] {
        &self.accounts
    }

    /// Look up one account.
    pub fn account(&self, name: &str) -> Option<&AccountStatus> {
        self.accounts.iter().find(|account| account.name == name)
    }

    /// Apply an event wholesale, returning the announcement it carries.
    ///
    /// Events for accounts the board does not list yet add them.
    pub fn apply(&mut self, event: StatusEvent) -> Option<NewMail> {
        let index = match self
            .accounts
            .iter()
            .position(|account| account.name == event.account)
        {
            Some(index) => index,
            None => {
                self.accounts.push(AccountStatus::pending(event.account.as_str()));
                self.accounts.len() - 1
            }
        };

        let entry = &mut self.accounts[index];
        entry.state = event.state;
        entry.error = event.error;
        entry.unseen = event.unseen;
        entry.reported = true;

        if event.new_subjects.is_empty() {
            return None;
        }

        Some(NewMail {
            account: event.account,
            unseen: event.unseen,
            subjects: event.new_subjects,
        })
    }

    /// Unseen messages across all accounts not currently in error.
    pub fn total_unseen(&self) -> usize {
        self.accounts
            .iter()
            .filter(|account| !account.error.is_error())
            .map(|account| account.unseen)
            .sum()
    }

    /// What an icon should show.
    pub fn indicator(&self) -> Indicator {
        if !self.accounts.iter().any(|account| account.reported) {
            return Indicator::Disconnected;
        }

        match self.total_unseen() {
            0 => Indicator::NoMail,
            1 => Indicator::OneMessage,
            _ => Indicator::ManyMessages,
        }
    }

    /// Human-readable status text: failing accounts first, then counts.
    pub fn summary(&self) -> String {
        if self.accounts.is_empty() {
            return "Not connected".to_owned();
        }

        let failing = self
            .accounts
            .iter()
            .filter(|account| account.error.is_error());
        let healthy = self
            .accounts
            .iter()
            .filter(|account| !account.error.is_error());

        let lines: Vec<String> = failing
            .chain(healthy)
            .filter_map(AccountStatus::summary_line)
            .collect();

        if lines.is_empty() {
            "Connecting".to_owned()
        } else {
            lines.join("\n")
        }
    }
}
