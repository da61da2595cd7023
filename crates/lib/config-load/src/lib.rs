//! Configuration loading for mail-watch.
//!
//! The file is taken from `MAIL_WATCH_CONFIG` when set, otherwise from the
//! first existing default location.

use std::path::PathBuf;

use config_core::Config;

mod locate;
mod paths;

pub use locate::*;
pub use paths::*;

/// The environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "MAIL_WATCH_CONFIG";

/// A convenience type-alias for the YAML parser error type.
pub type YamlError = serde_yaml_bw::Error;

/// Errors returned while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No configuration file could be read.
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// The configuration file is not valid.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,

        /// Underlying YAML error.
        #[source]
        source: YamlError,
    },
}

/// Parse configuration from a YAML string.
pub fn parse_str(contents: &str) -> Result<Config, YamlError> {
    serde_yaml_bw::from_str(contents)
}

/// Load configuration, using `env_path` instead of the defaults when given.
pub async fn with(env_path: Option<PathBuf>) -> Result<Located<Config>, LoadError> {
    let candidates: Vec<PathBuf> = resolve(env_path).collect();
    let Located { path, value } = read_first(&candidates).await?;

    let config = parse_str(&value).map_err(|source| LoadError::Parse {
        path: path.clone(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        accounts = config.accounts.len(),
        "configuration loaded"
    );

    Ok(Located {
        value: config,
        path,
    })
}

/// Errors returned by [`with_default_env_var`].
#[cfg(feature = "env")]
#[derive(Debug, thiserror::Error)]
pub enum WithDefaultEnvVarError {
    /// Env variable reading error.
    #[error("config path env var read: {0}")]
    Env(#[source] envfury::Error<envfury::ValueError<<PathBuf as std::str::FromStr>::Err>>),

    /// Loading error.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Load configuration, honouring [`CONFIG_ENV_VAR`].
#[cfg(feature = "env")]
pub async fn with_default_env_var() -> Result<Located<Config>, WithDefaultEnvVarError> {
    let env_path = envfury::maybe(CONFIG_ENV_VAR).map_err(WithDefaultEnvVarError::Env)?;
    Ok(with(env_path).await?)
}
