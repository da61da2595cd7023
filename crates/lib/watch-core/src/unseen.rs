//! Unseen message snapshot.

use std::collections::BTreeSet;

use crate::MessageId;

/// The last known set of unseen message identifiers of one account.
///
/// This is a snapshot of what the server reported, never an accumulation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnseenSet(BTreeSet<MessageId>);

impl UnseenSet {
    /// Number of unseen messages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no unseen messages.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the identifier was unseen at the last refresh.
    pub fn contains(&self, id: MessageId) -> bool {
        self.0.contains(&id)
    }

    /// Iterate the identifiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.0.iter().copied()
    }

    /// Borrow the underlying set.
    pub fn as_set(&self) -> &BTreeSet<MessageId> {
        &self.0
    }
}

impl From<BTreeSet<MessageId>> for UnseenSet {
    fn from(value: BTreeSet<MessageId>) -> Self {
        Self(value)
    }
}

impl FromIterator<MessageId> for UnseenSet {
    fn from_iter<T: IntoIterator<Item = MessageId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
