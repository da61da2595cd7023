//! TLS connector helpers.

/// Errors returned while preparing or establishing a TLS connection.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// Not a single system root certificate could be loaded.
    #[error("no usable system root certificates ({errors} load errors)")]
    NoRootCerts {
        /// How many errors the loader reported.
        errors: usize,
    },

    /// Invalid DNS name for TLS verification.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(String),

    /// TLS handshake or I/O error.
    #[error("TLS I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a rustls connector configured with system root certificates.
///
/// Unreadable certificates are skipped as long as at least one loads.
pub(crate) fn native_roots_connector() -> Result<tokio_rustls::TlsConnector, TlsError> {
    let rustls_native_certs::CertificateResult { certs, errors, .. } =
        rustls_native_certs::load_native_certs();
    for error in &errors {
        tracing::warn!(%error, "skipping unreadable system root certificate");
    }
    if certs.is_empty() {
        return Err(TlsError::NoRootCerts {
            errors: errors.len(),
        });
    }

    let mut root_store = rustls::RootCertStore::empty();
    let (added, ignored) = root_store.add_parsable_certificates(certs);
    tracing::debug!(added, ignored, "loaded system root certificates");

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Ok(tokio_rustls::TlsConnector::from(std::sync::Arc::new(
        config,
    )))
}

/// Run the TLS handshake over an established TCP stream.
pub(crate) async fn handshake(
    connector: &tokio_rustls::TlsConnector,
    server_name: &str,
    stream: tokio::net::TcpStream,
) -> Result<crate::Stream, TlsError> {
    let server_name = rustls::pki_types::ServerName::try_from(server_name.to_owned())
        .map_err(|_| TlsError::InvalidDnsName(server_name.to_owned()))?;
    let tls_stream = connector.connect(server_name, stream).await?;
    Ok(tls_stream)
}
