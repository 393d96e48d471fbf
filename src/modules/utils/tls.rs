// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, BulkMailerResult};
use crate::modules::imap::session::SessionStream;
use crate::raise_error;
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::ServerName;
use std::sync::Arc;
use tokio_rustls::TlsConnector;

/// Must run once before any TLS handshake. A second call fails.
pub fn install_crypto_provider() -> BulkMailerResult<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| {
            raise_error!(
                "a rustls crypto provider is already installed".into(),
                ErrorCode::InternalError
            )
        })
}

fn client_config(alpn_protocols: &[&str]) -> ClientConfig {
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let mut config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = alpn_protocols.iter().map(|p| p.as_bytes().to_vec()).collect();
    config
}

/// Upgrades an established stream with a handshake verified against the web PKI roots.
pub async fn establish_tls_stream(
    server_hostname: &str,
    alpn_protocols: &[&str],
    stream: impl SessionStream + 'static,
) -> BulkMailerResult<Box<dyn SessionStream>> {
    let server_name = ServerName::try_from(server_hostname.to_owned()).map_err(|_| {
        raise_error!(
            format!("'{}' is not a valid TLS server name", server_hostname),
            ErrorCode::NetworkError
        )
    })?;

    let connector = TlsConnector::from(Arc::new(client_config(alpn_protocols)));
    let tls_stream = connector.connect(server_name, stream).await.map_err(|e| {
        raise_error!(
            format!("TLS handshake with {} failed: {}", server_hostname, e),
            ErrorCode::NetworkError
        )
    })?;
    Ok(Box::new(tls_stream))
}
