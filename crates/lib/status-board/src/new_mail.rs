//! New mail announcements.

/// Messages that became unseen on one account.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewMail {
    /// Account name.
    pub account: String,

    /// Unseen count on the account after the refresh.
    pub unseen: usize,

    /// Subjects of the new messages, newest first.
    pub subjects: Vec<String>,
}

impl NewMail {
    /// Notification title.
    pub fn title(&self) -> String {
        format!("{} has new mail ({} unseen)", self.account, self.unseen)
    }

    /// Notification body, one `> subject` line per message.
    pub fn body(&self) -> String {
        self.subjects
            .iter()
            .map(|subject| format!("> {subject}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
