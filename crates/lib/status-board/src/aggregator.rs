//! The aggregator task.

use watch_core::StatusEvent;

use crate::{Board, NewMail};

/// Parameters for [`run`].
pub struct Params<OnNewMail> {
    /// Status events from all supervisors.
    pub events: tokio::sync::mpsc::Receiver<StatusEvent>,

    /// Where board snapshots are published.
    pub board: tokio::sync::watch::Sender<Board>,

    /// Called for every announcement, after the snapshot carrying it is
    /// published.
    pub on_new_mail: OnNewMail,
}

/// Apply events to the board until every sender is gone.
pub async fn run<OnNewMail, OnNewMailFut>(params: Params<OnNewMail>)
where
    OnNewMail: FnMut(NewMail) -> OnNewMailFut,
    OnNewMailFut: Future<Output = ()>,
{
    let Params {
        mut events,
        board,
        mut on_new_mail,
    } = params;

    while let Some(event) = events.recv().await {
        tracing::debug!(
            account = %event.account,
            state = ?event.state,
            error = %event.error,
            unseen = event.unseen,
            new = event.new_subjects.len(),
            "status event"
        );

        let mut new_mail = None;
        board.send_modify(|board| new_mail = board.apply(event));

        if let Some(new_mail) = new_mail {
            on_new_mail(new_mail).await;
        }
    }

    tracing::debug!("all status senders closed");
}
