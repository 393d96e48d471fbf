// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::Credential;
use crate::modules::bounce::parser::extract_failed_recipient;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::{BulkMailerError, BulkMailerResult};
use crate::modules::imap::mailbox::{ImapMailbox, MailboxConnector, MailboxSession};
use crate::modules::progress::ProgressLine;
use crate::modules::settings::cli::Settings;
use crate::{raise_error, run_with_timeout};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const APP_PASSWORD_HINT: &str = "check that you are using an app password";

#[derive(Clone, Debug)]
pub struct BounceQuery {
    pub credential: Credential,
    /// Only notifications received at or after this instant are reported.
    pub since: DateTime<Utc>,
}

/// Looks for delivery-failure notifications in the sender's inbox.
pub struct BounceScanner<M> {
    connector: M,
    sender_pattern: String,
    login_timeout: Duration,
}

impl BounceScanner<ImapMailbox> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ImapMailbox::from_settings(settings),
            settings.bulkmailer_mailer_daemon.clone(),
            settings.imap_timeout(),
        )
    }
}

impl<M: MailboxConnector> BounceScanner<M> {
    pub fn new(connector: M, sender_pattern: impl Into<String>, login_timeout: Duration) -> Self {
        Self {
            connector,
            sender_pattern: sender_pattern.into(),
            login_timeout,
        }
    }

    /// Never fails. Problems are reported as a single error line, and the
    /// session is logged out on every path once login succeeded.
    pub async fn scan(&self, query: &BounceQuery) -> Vec<ProgressLine> {
        let connected = run_with_timeout!(
            self.login_timeout,
            self.connector.connect(&query.credential),
            raise_error!(
                format!(
                    "mailbox login did not complete within {:?}",
                    self.login_timeout
                ),
                ErrorCode::ConnectionTimeout
            )
        )
        .and_then(|result| result);

        let mut session = match connected {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    "Bounce check for {} could not log in: {}",
                    query.credential.address, e
                );
                return vec![Self::error_line(&e)];
            }
        };

        let result = self.collect(&mut session, query).await;
        if let Err(e) = session.logout().await {
            debug!("IMAP logout returned: {}", e);
        }

        match result {
            Ok(lines) => {
                info!(
                    "Bounce check for {} found {} bounced recipients",
                    query.credential.address,
                    lines.len()
                );
                lines
            }
            Err(e) => {
                warn!("Bounce check for {} failed: {}", query.credential.address, e);
                vec![Self::error_line(&e)]
            }
        }
    }

    async fn collect(
        &self,
        session: &mut M::Session,
        query: &BounceQuery,
    ) -> BulkMailerResult<Vec<ProgressLine>> {
        let candidates = session
            .fetch_bounce_notifications(&self.sender_pattern, query.since)
            .await?;

        let mut lines = Vec::new();
        for candidate in candidates {
            // SINCE is day-granular on the server side.
            if candidate.internal_date.is_some_and(|at| at < query.since) {
                continue;
            }
            match extract_failed_recipient(&candidate.body) {
                Some(recipient) => lines.push(ProgressLine::bounced(recipient)),
                None => debug!(
                    "Notification uid={:?} has no permanent failure phrase, skipping",
                    candidate.uid
                ),
            }
        }
        Ok(lines)
    }

    fn error_line(error: &BulkMailerError) -> ProgressLine {
        match error.code() {
            ErrorCode::ImapAuthenticationFailed => ProgressLine::error(format!(
                "mailbox login failed, {}",
                APP_PASSWORD_HINT
            )),
            ErrorCode::ConnectionTimeout => ProgressLine::error(format!(
                "bounce check timed out: {}",
                error.message()
            )),
            _ => ProgressLine::error(format!(
                "could not check for bounces: {}",
                error.message()
            )),
        }
    }
}
