// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::{Credential, Encryption};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::settings::cli::Settings;
use crate::modules::smtp::client::{BulkSmtpClient, Sender};
use crate::raise_error;
use mail_send::{Credentials, SmtpClientBuilder};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Opens authenticated submission sessions for a sender credential.
pub trait SmtpConnector: Send + Sync {
    type Client: Sender;

    fn connect(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = BulkMailerResult<Self::Client>> + Send;
}

#[derive(Clone, Debug)]
pub struct SmtpClientManager {
    host: String,
    port: u16,
    encryption: Encryption,
    timeout: Duration,
}

impl SmtpClientManager {
    pub fn new(host: impl Into<String>, port: u16, encryption: Encryption, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            encryption,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.bulkmailer_smtp_host.clone(),
            settings.bulkmailer_smtp_port,
            settings.bulkmailer_smtp_encryption,
            settings.smtp_timeout(),
        )
    }
}

impl SmtpConnector for SmtpClientManager {
    type Client = BulkSmtpClient;

    async fn connect(&self, credential: &Credential) -> BulkMailerResult<BulkSmtpClient> {
        debug!(
            "Opening SMTP session to {}:{} ({}) for {}",
            self.host, self.port, self.encryption, credential.address
        );
        let credentials = Credentials::new(credential.address.clone(), credential.secret.clone());
        let builder = SmtpClientBuilder::new(self.host.clone(), self.port)
            .credentials(credentials)
            .timeout(self.timeout);

        let client = match self.encryption {
            Encryption::Ssl => {
                let client = builder.implicit_tls(true).connect().await.map_err(|e| {
                    raise_error!(e.to_string(), ErrorCode::SmtpConnectionFailed)
                })?;
                BulkSmtpClient::Tls(client)
            }
            Encryption::StartTls => {
                let client = builder.implicit_tls(false).connect().await.map_err(|e| {
                    raise_error!(e.to_string(), ErrorCode::SmtpConnectionFailed)
                })?;
                BulkSmtpClient::Tls(client)
            }
            Encryption::None => {
                let client = builder.connect_plain().await.map_err(|e| {
                    raise_error!(e.to_string(), ErrorCode::SmtpConnectionFailed)
                })?;
                BulkSmtpClient::Plain(client)
            }
        };

        Ok(client)
    }
}
