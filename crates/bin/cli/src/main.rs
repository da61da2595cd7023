//! Main entrypoint for the mailbox watcher.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Capacity of the status event channel.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Run the watcher until interrupted.
#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config_load::with_default_env_var().await?;
    let policy = config_bringup::retry_policy(&config.value.retry);
    let accounts = config_bringup::bringup_accounts(&config.value).await?;
    drop(config);

    if accounts.is_empty() {
        tracing::warn!("no accounts configured");
    }

    let connector = Arc::new(imap_transport::ImapConnector::with_native_roots()?);

    let (board_sender, mut board_receiver) = tokio::sync::watch::channel(status_board::Board::new(
        accounts.iter().map(|account| account.name.clone()),
    ));
    let (event_sender, event_receiver) = tokio::sync::mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let aggregator = tokio::spawn(status_board::run(status_board::Params {
        events: event_receiver,
        board: board_sender,
        on_new_mail: |new_mail: status_board::NewMail| async move {
            tracing::info!(
                account = %new_mail.account,
                unseen = new_mail.unseen,
                "{}\n{}",
                new_mail.title(),
                new_mail.body()
            );
        },
    }));

    let notify = move |event: watch_core::StatusEvent| {
        let event_sender = event_sender.clone();
        async move {
            let _ = event_sender.send(event).await;
        }
    };

    let cancel = session_core::CancellationToken::new();
    let mut join_set = tokio::task::JoinSet::new();

    watch_engine::spawn_watchers(watch_engine::SpawnWatchersParams {
        accounts,
        connector,
        join_set: &mut join_set,
        notify,
        policy,
        cancel: &cancel,
    });

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                result?;
                tracing::info!("interrupted, shutting down");
                cancel.cancel();
            }
            Ok(()) = board_receiver.changed() => {
                let board = board_receiver.borrow_and_update();
                tracing::info!(
                    indicator = ?board.indicator(),
                    total_unseen = board.total_unseen(),
                    "{}",
                    board.summary()
                );
            }
            Some(joined) = join_set.join_next() => {
                let (account, exit) = joined?;
                match exit {
                    account_supervisor::Exit::Cancelled => {
                        tracing::debug!(%account, "watcher stopped");
                    }
                    account_supervisor::Exit::Failed(error) => {
                        tracing::error!(%account, %error, "watcher gave up");
                    }
                }
            }
            else => break,
        }
    }

    aggregator.await?;

    tracing::info!("exiting");

    Ok(())
}
