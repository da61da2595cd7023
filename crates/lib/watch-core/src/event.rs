//! Status events.

/// A change in one account's status, as seen by the aggregator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusEvent {
    /// Account name.
    pub account: String,

    /// Connection state at the time of the event.
    pub state: crate::ConnectionState,

    /// Current error code.
    pub error: crate::ErrorCode,

    /// Current number of unseen messages.
    pub unseen: usize,

    /// Subjects of messages that became unseen since the previous snapshot,
    /// newest first. Empty when nothing new appeared.
    pub new_subjects: Vec<String>,
}

impl StatusEvent {
    /// Whether the event announces new messages.
    pub fn has_new_mail(&self) -> bool {
        !self.new_subjects.is_empty()
    }
}
