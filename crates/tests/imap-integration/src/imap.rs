//! IMAP connectivity helpers.

use std::time::Duration;

use tokio::net::TcpStream;

/// How often to try reaching a starting server.
const CONNECT_ATTEMPTS: u8 = 60;

/// Pause between connection attempts.
const CONNECT_PAUSE: Duration = Duration::from_millis(250);

/// Log in over plain TCP, retrying until the server is up.
pub async fn login_with_retry(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
) -> Result<async_imap::Session<TcpStream>, std::io::Error> {
    let mut attempts_left = CONNECT_ATTEMPTS;
    loop {
        let error = match login(host, port, user, password).await {
            Ok(session) => return Ok(session),
            Err(error) => error,
        };

        attempts_left = attempts_left.saturating_sub(1);
        if attempts_left == 0 {
            return Err(error);
        }
        tokio::time::sleep(CONNECT_PAUSE).await;
    }
}

/// Log in and hand the session to the watcher transport.
pub async fn watcher_session(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
) -> Result<imap_transport::ImapSession<TcpStream>, std::io::Error> {
    let session = login_with_retry(host, port, user, password).await?;
    Ok(imap_transport::ImapSession::from_session(session))
}

/// One login attempt.
async fn login(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
) -> Result<async_imap::Session<TcpStream>, std::io::Error> {
    let stream = TcpStream::connect((host, port)).await?;
    let mut client = async_imap::Client::new(stream);

    let Some(_) = client.read_response().await? else {
        return Err(std::io::Error::other("missing IMAP greeting"));
    };

    client
        .login(user, password)
        .await
        .map_err(|(error, _client)| std::io::Error::other(error))
}
