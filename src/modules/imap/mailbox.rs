// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::{Credential, Encryption};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::imap::client::{imap_error, Client, Session};
use crate::modules::settings::cli::Settings;
use async_imap::types::Fetch;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const INBOX: &str = "INBOX";
/// Fetching `BODY[]` rather than `BODY.PEEK[]` marks the message `\Seen`.
const BODY_FETCH_COMMAND: &str = "(UID INTERNALDATE BODY[])";

/// A message that matched the notification search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BounceCandidate {
    pub uid: Option<u32>,
    pub internal_date: Option<DateTime<Utc>>,
    pub body: Vec<u8>,
}

/// An authenticated mailbox session scoped to one scan.
pub trait MailboxSession: Send {
    /// Returns matching notifications from the inbox received on or after the
    /// day of `since`. The server narrows by date only.
    fn fetch_bounce_notifications(
        &mut self,
        sender_pattern: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = BulkMailerResult<Vec<BounceCandidate>>> + Send;

    fn logout(self) -> impl Future<Output = BulkMailerResult<()>> + Send
    where
        Self: Sized;
}

/// Opens and authenticates mailbox sessions.
pub trait MailboxConnector: Send + Sync {
    type Session: MailboxSession;

    fn connect(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = BulkMailerResult<Self::Session>> + Send;
}

#[derive(Clone, Debug)]
pub struct ImapMailbox {
    host: String,
    port: u16,
    encryption: Encryption,
    io_timeout: Duration,
}

impl ImapMailbox {
    pub fn new(host: impl Into<String>, port: u16, encryption: Encryption, io_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            encryption,
            io_timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.bulkmailer_imap_host.clone(),
            settings.bulkmailer_imap_port,
            settings.bulkmailer_imap_encryption,
            settings.imap_timeout(),
        )
    }
}

impl MailboxConnector for ImapMailbox {
    type Session = ImapMailboxSession;

    async fn connect(&self, credential: &Credential) -> BulkMailerResult<ImapMailboxSession> {
        let client =
            Client::connection(&self.host, self.encryption, self.port, self.io_timeout).await?;
        let session = client.login(&credential.address, &credential.secret).await?;
        debug!("IMAP login succeeded for {}", credential.address);
        Ok(ImapMailboxSession { session })
    }
}

pub struct ImapMailboxSession {
    session: Session,
}

/// SINCE compares dates in each message's own zone, so the search starts one
/// day early. The precise cut on INTERNALDATE happens after the fetch.
pub(crate) fn search_query(sender_pattern: &str, since: DateTime<Utc>) -> String {
    let pattern = sender_pattern.replace('\\', "\\\\").replace('"', "\\\"");
    let day = since - chrono::Duration::days(1);
    format!("SINCE {} FROM \"{}\"", day.format("%-d-%b-%Y"), pattern)
}

fn to_candidate(fetch: &Fetch) -> Option<BounceCandidate> {
    let body = fetch.body()?;
    Some(BounceCandidate {
        uid: fetch.uid,
        internal_date: fetch.internal_date().map(|d| d.with_timezone(&Utc)),
        body: body.to_vec(),
    })
}

impl MailboxSession for ImapMailboxSession {
    async fn fetch_bounce_notifications(
        &mut self,
        sender_pattern: &str,
        since: DateTime<Utc>,
    ) -> BulkMailerResult<Vec<BounceCandidate>> {
        self.session
            .select(INBOX)
            .await
            .map_err(|e| imap_error(e, ErrorCode::ImapCommandFailed))?;

        let query = search_query(sender_pattern, since);
        let uids = self
            .session
            .uid_search(&query)
            .await
            .map_err(|e| imap_error(e, ErrorCode::ImapCommandFailed))?;
        debug!("UID SEARCH {} matched {} messages", query, uids.len());
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();
        let uid_set = uids
            .iter()
            .map(|uid| uid.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let fetches = self
            .session
            .uid_fetch(uid_set.as_str(), BODY_FETCH_COMMAND)
            .await
            .map_err(|e| imap_error(e, ErrorCode::ImapCommandFailed))?
            .try_collect::<Vec<Fetch>>()
            .await
            .map_err(|e| imap_error(e, ErrorCode::ImapCommandFailed))?;

        let candidates: Vec<BounceCandidate> = fetches.iter().filter_map(to_candidate).collect();
        if candidates.len() != fetches.len() {
            debug!(
                "{} of {} fetched messages carried no body",
                fetches.len() - candidates.len(),
                fetches.len()
            );
        }
        Ok(candidates)
    }

    async fn logout(mut self) -> BulkMailerResult<()> {
        self.session
            .logout()
            .await
            .map_err(|e| imap_error(e, ErrorCode::ImapCommandFailed))
    }
}
