//! Password resolution.

use config_core::PasswordSource;
use watch_core::Password;

/// Shell used to run password commands.
const SHELL: &str = "/bin/sh";

/// Resolve the password of an account.
///
/// A failing password command is logged and yields an empty password, so the
/// account still shows up and reports missing credentials.
pub async fn resolve_password(account: &str, source: &PasswordSource) -> Password {
    match source {
        PasswordSource::Plain(password) => Password::new(password.clone()),
        PasswordSource::Command { command } => match run_password_command(command).await {
            Ok(password) => password,
            Err(error) => {
                tracing::error!(account, %error, "password command failed");
                Password::default()
            }
        },
    }
}

/// Errors returned by [`run_password_command`].
#[derive(Debug, thiserror::Error)]
pub enum PasswordCommandError {
    /// The shell could not be started.
    #[error("failed to spawn the shell: {0}")]
    Spawn(#[source] std::io::Error),

    /// The command exited unsuccessfully.
    #[error("command exited with {status}: {stderr}")]
    Failed {
        /// Exit status.
        status: std::process::ExitStatus,

        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The command printed something that is not UTF-8.
    #[error("command output is not UTF-8: {0}")]
    NotUtf8(#[source] std::string::FromUtf8Error),
}

/// Run `command` through the shell and take its standard output, without
/// trailing line breaks, as the password.
pub async fn run_password_command(command: &str) -> Result<Password, PasswordCommandError> {
    let output = tokio::process::Command::new(SHELL)
        .arg("-c")
        .arg(command)
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(PasswordCommandError::Spawn)?;

    if !output.status.success() {
        return Err(PasswordCommandError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    let mut stdout = String::from_utf8(output.stdout).map_err(PasswordCommandError::NotUtf8)?;
    let trimmed_len = stdout.trim_end_matches(['\r', '\n']).len();
    stdout.truncate(trimmed_len);

    Ok(Password::new(stdout))
}
