// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::BulkMailerResult;
use crate::modules::progress::{ProgressLine, ProgressSink};
use crate::modules::smtp::client::Sender;
use crate::modules::smtp::log::SendLog;
use crate::modules::smtp::manager::SmtpConnector;
use crate::modules::smtp::request::SendRequest;
use crate::modules::smtp::template::render::Templates;
use tracing::{debug, info, warn};

pub const CANCELLED_NOTICE: &str = "cancelled by user";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchOutcome {
    Completed { succeeded: usize, failed: usize },
    /// Stopped before sending to the recipient at index `attempted`.
    Cancelled { attempted: usize },
}

/// Sends one message per recipient over a single submission session.
pub struct MailDispatcher<C> {
    connector: C,
    templates: Templates,
    send_log: SendLog,
}

/// The session is opened lazily before the first recipient. `Err` holds the
/// reason it could not be opened and is reported for every recipient.
type Session<T> = Option<Result<T, String>>;

impl<C: SmtpConnector> MailDispatcher<C> {
    pub fn new(connector: C, send_log: SendLog) -> BulkMailerResult<Self> {
        Ok(Self {
            connector,
            templates: Templates::new()?,
            send_log,
        })
    }

    /// Emits exactly one success or failure line per recipient, in order.
    ///
    /// Cancellation is checked before each recipient. A send already handed to
    /// the server runs to completion.
    pub async fn send(
        &self,
        request: &SendRequest,
        sink: &ProgressSink,
    ) -> BulkMailerResult<DispatchOutcome> {
        let styled_html = self.templates.render_styled_html(&request.html_body)?;
        let mut session: Session<C::Client> = None;
        let mut succeeded = 0;
        let mut failed = 0;

        for (index, recipient) in request.recipients.iter().enumerate() {
            if request.cancellation.is_cancelled() || sink.cancellation_requested() {
                info!(
                    "Send for {} cancelled before recipient {} of {}",
                    request.credential.address,
                    index + 1,
                    request.recipients.len()
                );
                sink.emit(ProgressLine::notice(CANCELLED_NOTICE)).await;
                Self::close(session).await;
                return Ok(DispatchOutcome::Cancelled { attempted: index });
            }

            let state = match session.take() {
                Some(state) => state,
                None => self.open(request).await,
            };
            let line = match session.insert(state) {
                Ok(client) => match self.deliver(client, request, recipient, &styled_html).await {
                    Ok(()) => {
                        succeeded += 1;
                        ProgressLine::success(recipient.as_str())
                    }
                    Err(e) => {
                        if let Err(reset) = client.reset().await {
                            debug!("RSET after failed send returned: {}", reset);
                        }
                        failed += 1;
                        ProgressLine::failure(recipient.as_str(), e.message())
                    }
                },
                Err(reason) => {
                    failed += 1;
                    ProgressLine::failure(recipient.as_str(), reason.as_str())
                }
            };

            if let Err(e) = self.send_log.append(&line).await {
                warn!("{}", e);
            }
            sink.emit(line).await;
        }

        Self::close(session).await;
        info!(
            "Send for {} finished: {} succeeded, {} failed",
            request.credential.address, succeeded, failed
        );
        Ok(DispatchOutcome::Completed { succeeded, failed })
    }

    async fn open(&self, request: &SendRequest) -> Result<C::Client, String> {
        self.connector
            .connect(&request.credential)
            .await
            .map_err(|e| {
                warn!(
                    "Unable to open SMTP session for {}: {}",
                    request.credential.address, e
                );
                e.message().to_string()
            })
    }

    async fn deliver(
        &self,
        client: &mut C::Client,
        request: &SendRequest,
        recipient: &str,
        styled_html: &str,
    ) -> BulkMailerResult<()> {
        let message = request.build_message(recipient, styled_html)?;
        client.send_email(message).await
    }

    async fn close(session: Session<C::Client>) {
        if let Some(Ok(client)) = session {
            if let Err(e) = client.quit().await {
                debug!("QUIT returned: {}", e);
            }
        }
    }
}
