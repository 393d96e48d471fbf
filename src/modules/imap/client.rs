use crate::modules::account::entity::Encryption;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::{BulkMailerError, BulkMailerResult};
use crate::modules::imap::session::SessionStream;
use crate::modules::utils::net::{
    establish_tcp_connection_with_timeout, establish_tls_connection, resolve_to_socket_addr,
};
use crate::modules::utils::tls::establish_tls_stream;
use crate::raise_error;
use async_imap::Client as ImapClient;
use async_imap::Session as ImapSession;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::BufWriter;
use tracing::debug;

pub(crate) type Session = ImapSession<Box<dyn SessionStream>>;

#[derive(Debug)]
pub(crate) struct Client {
    inner: ImapClient<Box<dyn SessionStream>>,
}

fn alpn(port: u16) -> &'static [&'static str] {
    if port == 993 {
        &[]
    } else {
        &["imap"]
    }
}

/// Maps a protocol error, keeping stalled reads distinguishable as timeouts.
pub(crate) fn imap_error(e: async_imap::error::Error, code: ErrorCode) -> BulkMailerError {
    match e {
        async_imap::error::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            raise_error!(io.to_string(), ErrorCode::ConnectionTimeout)
        }
        other => raise_error!(other.to_string(), code),
    }
}

impl Client {
    fn new(stream: Box<dyn SessionStream>) -> Self {
        Self {
            inner: ImapClient::new(stream),
        }
    }

    pub(crate) async fn login(self, username: &str, password: &str) -> BulkMailerResult<Session> {
        let Client { inner } = self;
        inner
            .login(username, password)
            .await
            .map_err(|(e, _)| imap_error(e, ErrorCode::ImapAuthenticationFailed))
    }

    pub async fn connection(
        domain: &str,
        encryption: Encryption,
        port: u16,
        io_timeout: Duration,
    ) -> BulkMailerResult<Self> {
        let resolved_addr = resolve_to_socket_addr(domain, port)?;
        debug!("Attempting IMAP connection to {domain} ({resolved_addr}).");
        match encryption {
            Encryption::Ssl => {
                Self::establish_secure_connection(resolved_addr, domain, io_timeout).await
            }
            Encryption::StartTls => {
                Self::establish_starttls_connection(resolved_addr, domain, io_timeout).await
            }
            Encryption::None => {
                Self::establish_insecure_connection(resolved_addr, io_timeout).await
            }
        }
    }

    async fn read_greeting(&mut self) -> BulkMailerResult<()> {
        self.inner
            .read_response()
            .await
            .map_err(|e| raise_error!(e.to_string(), ErrorCode::ImapCommandFailed))?
            .ok_or_else(|| {
                raise_error!(
                    "failed to read greeting".into(),
                    ErrorCode::ImapCommandFailed
                )
            })
            .map(|_| ())
    }

    async fn establish_secure_connection(
        address: SocketAddr,
        server_hostname: &str,
        io_timeout: Duration,
    ) -> BulkMailerResult<Self> {
        let tls_stream =
            establish_tls_connection(address, server_hostname, alpn(address.port()), io_timeout)
                .await?;
        let session_stream: Box<dyn SessionStream> = Box::new(BufWriter::new(tls_stream));
        let mut client = Client::new(session_stream);
        client.read_greeting().await?;
        Ok(client)
    }

    async fn establish_insecure_connection(
        address: SocketAddr,
        io_timeout: Duration,
    ) -> BulkMailerResult<Self> {
        let tcp_stream = establish_tcp_connection_with_timeout(address, io_timeout).await?;
        let session_stream: Box<dyn SessionStream> = Box::new(BufWriter::new(tcp_stream));
        let mut client = Client::new(session_stream);
        client.read_greeting().await?;
        Ok(client)
    }

    async fn establish_starttls_connection(
        address: SocketAddr,
        server_hostname: &str,
        io_timeout: Duration,
    ) -> BulkMailerResult<Self> {
        let tcp_stream = establish_tcp_connection_with_timeout(address, io_timeout).await?;
        let mut client = async_imap::Client::new(BufWriter::new(tcp_stream));

        let _greeting = client
            .read_response()
            .await
            .map_err(|e| raise_error!(e.to_string(), ErrorCode::ImapCommandFailed))?
            .ok_or_else(|| {
                raise_error!(
                    "failed to read greeting".into(),
                    ErrorCode::ImapCommandFailed
                )
            })?;

        client
            .run_command_and_check_ok("STARTTLS", None)
            .await
            .map_err(|_| {
                raise_error!(
                    "STARTTLS command failed".into(),
                    ErrorCode::ImapCommandFailed
                )
            })?;

        // Upgrade the plain stream in place once the server accepted STARTTLS.
        let tcp_stream = client.into_inner().into_inner();
        let tls_stream = establish_tls_stream(server_hostname, &[], tcp_stream).await?;
        let session_stream: Box<dyn SessionStream> = Box::new(BufWriter::new(tls_stream));
        Ok(Client::new(session_stream))
    }
}
