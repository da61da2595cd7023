//! Error types.

/// Config bringup error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Two accounts share a name.
    #[error("duplicate account name \"{name}\"")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// An account is invalid.
    #[error("account \"{name}\": {source}")]
    Account {
        /// The account name.
        name: String,

        /// What is wrong with it.
        #[source]
        source: AccountError,
    },
}

/// Account bringup error.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The account has no name.
    #[error("account name is empty")]
    EmptyName,

    /// The poll interval is zero.
    #[error("poll interval must be at least one minute")]
    ZeroPollInterval,
}
