// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::Credential;
use crate::modules::account::load_accounts;
use crate::modules::bounce::scanner::BounceScanner;
use crate::modules::error::BulkMailerResult;
use crate::modules::imap::mailbox::ImapMailbox;
use crate::modules::orchestrator::SendOrchestrator;
use crate::modules::settings::cli::Settings;
use crate::modules::smtp::dispatcher::MailDispatcher;
use crate::modules::smtp::log::SendLog;
use crate::modules::smtp::manager::SmtpClientManager;
use crate::{raise_error, utc_now};
use std::sync::Arc;
use tracing::warn;

pub mod status;

pub type DefaultOrchestrator = SendOrchestrator<SmtpClientManager, ImapMailbox>;

/// Process-wide state built once at startup and handed to every handler.
pub struct AppContext {
    pub settings: Settings,
    start_at: i64,
    /// Kept as parsed so a bad value only affects the accounts listing.
    accounts: BulkMailerResult<Vec<Credential>>,
    orchestrator: Arc<DefaultOrchestrator>,
    bounce_scanner: BounceScanner<ImapMailbox>,
    send_log: SendLog,
}

impl AppContext {
    pub fn new(settings: Settings) -> BulkMailerResult<Self> {
        let accounts = load_accounts(settings.bulkmailer_accounts.as_deref());
        if let Err(e) = &accounts {
            warn!("Sender accounts are unavailable: {}", e);
        }
        let send_log = SendLog::new(settings.send_log_path());
        let dispatcher = MailDispatcher::new(
            SmtpClientManager::from_settings(&settings),
            send_log.clone(),
        )?;
        let orchestrator = Arc::new(SendOrchestrator::new(
            dispatcher,
            BounceScanner::from_settings(&settings),
            settings.bounce_check_delay(),
        ));
        Ok(Self {
            bounce_scanner: BounceScanner::from_settings(&settings),
            start_at: utc_now!(),
            accounts,
            orchestrator,
            send_log,
            settings,
        })
    }

    pub fn uptime_ms(&self) -> i64 {
        utc_now!() - self.start_at
    }

    pub fn accounts(&self) -> BulkMailerResult<&[Credential]> {
        match &self.accounts {
            Ok(accounts) => Ok(accounts),
            Err(e) => Err(raise_error!(e.message().to_string(), e.code())),
        }
    }

    pub fn orchestrator(&self) -> Arc<DefaultOrchestrator> {
        self.orchestrator.clone()
    }

    pub fn bounce_scanner(&self) -> &BounceScanner<ImapMailbox> {
        &self.bounce_scanner
    }

    pub fn send_log(&self) -> &SendLog {
        &self.send_log
    }

    pub fn progress_buffer(&self) -> usize {
        self.settings.bulkmailer_progress_buffer as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::error::code::ErrorCode;

    #[test]
    fn builds_from_test_settings() {
        let mut settings = Settings::new_for_test();
        settings.bulkmailer_accounts =
            Some(r#"[{"address":"a@example.com","secret":"s"}]"#.into());
        let context = AppContext::new(settings).unwrap();
        assert_eq!(context.accounts().unwrap().len(), 1);
        assert!(context.send_log().path().ends_with("send-log.txt"));
        assert!(context.uptime_ms() >= 0);
    }

    #[test]
    fn malformed_accounts_only_fail_the_listing() {
        let mut settings = Settings::new_for_test();
        settings.bulkmailer_accounts = Some("nope".into());
        let context = AppContext::new(settings).unwrap();
        let err = context.accounts().unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingConfiguration);
    }
}
