use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::raise_error;
use mail_send::smtp::message::Message;
use mail_send::SmtpClient;
use std::future::Future;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

pub enum BulkSmtpClient {
    Plain(SmtpClient<TcpStream>),
    Tls(SmtpClient<TlsStream<TcpStream>>),
}

/// An authenticated submission session.
pub trait Sender: Send {
    fn send_email(
        &mut self,
        message: Message<'static>,
    ) -> impl Future<Output = BulkMailerResult<()>> + Send;

    fn reset(&mut self) -> impl Future<Output = BulkMailerResult<()>> + Send;

    fn quit(self) -> impl Future<Output = BulkMailerResult<()>> + Send
    where
        Self: Sized;
}

impl Sender for BulkSmtpClient {
    async fn send_email(&mut self, message: Message<'static>) -> BulkMailerResult<()> {
        match self {
            BulkSmtpClient::Plain(smtp_client) => smtp_client
                .send(message)
                .await
                .map_err(|e| raise_error!(e.to_string(), ErrorCode::SmtpCommandFailed)),
            BulkSmtpClient::Tls(smtp_client) => smtp_client
                .send(message)
                .await
                .map_err(|e| raise_error!(e.to_string(), ErrorCode::SmtpCommandFailed)),
        }
    }

    async fn reset(&mut self) -> BulkMailerResult<()> {
        match self {
            BulkSmtpClient::Plain(smtp_client) => smtp_client
                .rset()
                .await
                .map_err(|e| raise_error!(e.to_string(), ErrorCode::SmtpCommandFailed)),
            BulkSmtpClient::Tls(smtp_client) => smtp_client
                .rset()
                .await
                .map_err(|e| raise_error!(e.to_string(), ErrorCode::SmtpCommandFailed)),
        }
    }

    async fn quit(self) -> BulkMailerResult<()> {
        match self {
            BulkSmtpClient::Plain(smtp_client) => smtp_client
                .quit()
                .await
                .map_err(|e| raise_error!(e.to_string(), ErrorCode::SmtpCommandFailed)),
            BulkSmtpClient::Tls(smtp_client) => smtp_client
                .quit()
                .await
                .map_err(|e| raise_error!(e.to_string(), ErrorCode::SmtpCommandFailed)),
        }
    }
}
