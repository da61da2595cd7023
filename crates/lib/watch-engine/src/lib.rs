//! Watch engine.
//!
//! Spawns one account supervisor per configured account into a
//! [`tokio::task::JoinSet`]. Accounts share the connector and the status
//! event sink, and nothing else.

use std::sync::Arc;

use account_supervisor::{Exit, RetryPolicy};
use session_core::{CancellationToken, Connector};
use watch_core::{AccountDescriptor, StatusEvent};

/// What a finished watcher task yields: the account name and why its
/// supervisor stopped.
pub type WatcherExit = (String, Exit);

/// Parameters for [`spawn_watchers`].
pub struct SpawnWatchersParams<'a, C, Notify> {
    /// Accounts to watch.
    pub accounts: Vec<AccountDescriptor>,

    /// Connector shared by all accounts.
    pub connector: Arc<C>,

    /// `JoinSet` to spawn tasks into.
    pub join_set: &'a mut tokio::task::JoinSet<WatcherExit>,

    /// Status event sink, cloned into every task.
    pub notify: Notify,

    /// Retry timings applied to every account.
    pub policy: RetryPolicy,

    /// Parent token; each account gets a child of it.
    pub cancel: &'a CancellationToken,
}

/// Spawn a supervisor task for every account.
pub fn spawn_watchers<C, Notify, NotifyFut>(params: SpawnWatchersParams<'_, C, Notify>)
where
    C: Connector + 'static,
    Notify: FnMut(StatusEvent) -> NotifyFut + Clone + Send + Sync + 'static,
    NotifyFut: Future<Output = ()> + Send + 'static,
{
    let SpawnWatchersParams {
        accounts,
        connector,
        join_set,
        notify,
        policy,
        cancel,
    } = params;

    for account in accounts {
        tracing::info!(
            account = %account.name,
            server = %account.server,
            folder = %account.folder,
            "spawning watcher"
        );

        let connector = Arc::clone(&connector);
        let notify = notify.clone();
        let cancel = cancel.child_token();

        join_set.spawn(async move {
            let exit = account_supervisor::run(account_supervisor::Params {
                connector: connector.as_ref(),
                account: &account,
                notify,
                sleep: tokio::time::sleep,
                policy,
                cancel,
            })
            .await;

            (account.name, exit)
        });
    }
}
