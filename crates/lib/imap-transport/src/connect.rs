//! Opening IMAP connections.

use std::time::Duration;

use watch_core::{ServerAddress, TlsMode};

/// Errors returned while connecting to an IMAP server.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// TCP connection error.
    #[error("TCP connection error: {0}")]
    TcpConnect(#[source] std::io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[source] crate::TlsError),

    /// IMAP protocol error.
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    /// I/O error while reading the greeting.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server did not send the expected greeting.
    #[error("IMAP server sent no greeting")]
    MissingGreeting,

    /// The connection was not established in time.
    #[error("connection not established within {0:?}")]
    Timeout(Duration),
}

/// Connect to the server, secure the stream and consume the greeting.
pub(crate) async fn open(
    tls: &tokio_rustls::TlsConnector,
    server: &ServerAddress,
) -> Result<async_imap::Client<crate::Stream>, ConnectError> {
    let tcp_stream = tokio::net::TcpStream::connect((server.host.as_str(), server.port))
        .await
        .map_err(ConnectError::TcpConnect)?;

    let client = match server.tls_mode {
        TlsMode::Implicit => {
            let stream = crate::tls::handshake(tls, &server.tls_server_name, tcp_stream)
                .await
                .map_err(ConnectError::Tls)?;
            let mut client = async_imap::Client::new(stream);
            client
                .read_response()
                .await?
                .ok_or(ConnectError::MissingGreeting)?;
            client
        }
        TlsMode::StartTls => {
            let mut client = async_imap::Client::new(tcp_stream);
            client
                .read_response()
                .await?
                .ok_or(ConnectError::MissingGreeting)?;
            client.run_command_and_check_ok("STARTTLS", None).await?;
            let tcp_stream = client.into_inner();
            let stream = crate::tls::handshake(tls, &server.tls_server_name, tcp_stream)
                .await
                .map_err(ConnectError::Tls)?;
            async_imap::Client::new(stream)
        }
    };

    Ok(client)
}
