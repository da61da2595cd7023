//! Lift raw config into account descriptors.

use std::collections::HashSet;
use std::time::Duration;

use account_supervisor::RetryPolicy;
use watch_core::{AccountDescriptor, ServerAddress};

mod error;
mod password;

pub use error::*;
pub use password::*;

/// Convert config TLS mode to the watcher TLS mode.
fn map_tls_mode(mode: config_core::TlsMode) -> watch_core::TlsMode {
    match mode {
        config_core::TlsMode::Implicit => watch_core::TlsMode::Implicit,
        config_core::TlsMode::StartTls => watch_core::TlsMode::StartTls,
    }
}

/// Build the server address of an account, filling in the conventional
/// port and the host as TLS server name.
pub fn server_address(account: &config_core::AccountConfig) -> ServerAddress {
    let tls_mode = map_tls_mode(account.tls.mode);
    ServerAddress {
        host: account.host.clone(),
        port: account.port.unwrap_or_else(|| tls_mode.default_port()),
        tls_mode,
        tls_server_name: account
            .tls
            .server_name
            .clone()
            .unwrap_or_else(|| account.host.clone()),
    }
}

/// Build a descriptor for one account, resolving its password.
pub async fn bringup_account(
    account: &config_core::AccountConfig,
) -> Result<AccountDescriptor, AccountError> {
    if account.name.trim().is_empty() {
        return Err(AccountError::EmptyName);
    }

    let poll_interval = match account.poll_interval_mins {
        Some(0) => return Err(AccountError::ZeroPollInterval),
        Some(mins) => Duration::from_secs(mins.saturating_mul(60)),
        None => watch_core::DEFAULT_POLL_INTERVAL,
    };

    let password = resolve_password(&account.name, &account.password).await;

    let mut descriptor = AccountDescriptor::new(
        account.name.clone(),
        server_address(account),
        account.username.clone(),
        password,
    );
    if let Some(folder) = &account.folder {
        descriptor.folder = folder.clone();
    }
    descriptor.poll_interval = poll_interval;

    Ok(descriptor)
}

/// Build descriptors for all accounts, in config order.
pub async fn bringup_accounts(
    config: &config_core::Config,
) -> Result<Vec<AccountDescriptor>, ConfigError> {
    let mut names = HashSet::new();
    let mut descriptors = Vec::with_capacity(config.accounts.len());

    for account in &config.accounts {
        if !names.insert(account.name.as_str()) {
            return Err(ConfigError::DuplicateName {
                name: account.name.clone(),
            });
        }

        let descriptor =
            bringup_account(account)
                .await
                .map_err(|source| ConfigError::Account {
                    name: account.name.clone(),
                    source,
                })?;
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}

/// Build the retry policy, keeping defaults for anything unset.
pub fn retry_policy(retry: &config_core::RetryConfig) -> RetryPolicy {
    let defaults = RetryPolicy::default();
    let secs = |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_secs);

    RetryPolicy {
        connect_failure_delay: secs(
            retry.connect_failure_delay_secs,
            defaults.connect_failure_delay,
        ),
        drop_retry_delay: secs(retry.drop_retry_delay_secs, defaults.drop_retry_delay),
        close_grace: secs(retry.close_grace_secs, defaults.close_grace),
    }
}
