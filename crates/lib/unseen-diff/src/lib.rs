//! Unseen diff engine.
//!
//! Turns "what the server currently considers unseen" into "what is actually
//! new to the user", and fetches subjects for the new messages only.

use std::collections::BTreeSet;

use session_core::Session;
use watch_core::{AccountState, MessageId, StatusEvent, UnseenSet};

/// Errors returned by [`refresh`].
///
/// On either error the account state is left exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError<E> {
    /// Searching for unseen messages failed.
    #[error("unseen search failed: {0}")]
    Search(#[source] E),

    /// Fetching subjects of new messages failed.
    #[error("subject fetch failed: {0}")]
    FetchSubjects(#[source] E),
}

/// Outcome of a successful [`refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed {
    /// Unseen count after the refresh.
    pub unseen: usize,

    /// Identifiers that were not unseen before, ascending.
    pub new_ids: Vec<MessageId>,
}

/// Identifiers unseen now that were not unseen in `previous`, ascending.
pub fn diff(previous: &UnseenSet, current: &BTreeSet<MessageId>) -> Vec<MessageId> {
    current.difference(previous.as_set()).copied().collect()
}

/// Re-read the unseen set, work out what is new and report it.
///
/// The snapshot in `state` is replaced wholesale and exactly one status event
/// describing it is passed to `notify`.
pub async fn refresh<S, Notify, NotifyFut>(
    session: &mut S,
    account: &str,
    state: &mut AccountState,
    notify: &mut Notify,
) -> Result<Refreshed, RefreshError<S::Error>>
where
    S: Session,
    Notify: FnMut(StatusEvent) -> NotifyFut + Send,
    NotifyFut: Future<Output = ()> + Send,
{
    let current = session
        .search_unseen()
        .await
        .map_err(RefreshError::Search)?;

    let new_ids = diff(state.unseen(), &current);

    let new_subjects = if new_ids.is_empty() {
        Vec::new()
    } else {
        let fetched = session
            .fetch_subjects(&new_ids)
            .await
            .map_err(RefreshError::FetchSubjects)?;

        // Fetched in ascending order; the most recent message goes first.
        fetched.into_iter().rev().map(|(_, subject)| subject).collect()
    };

    state.replace_unseen(current);
    let unseen = state.unseen().len();

    tracing::info!(account, unseen, new = new_ids.len(), "unseen messages refreshed");
    for subject in &new_subjects {
        tracing::debug!(account, %subject, "new unseen message");
    }

    notify(state.event(account, new_subjects)).await;

    Ok(Refreshed { unseen, new_ids })
}
