// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::bounce::scanner::{BounceQuery, BounceScanner};
use crate::modules::error::BulkMailerResult;
use crate::modules::imap::mailbox::MailboxConnector;
use crate::modules::progress::{ProgressLine, ProgressSink};
use crate::modules::smtp::dispatcher::{DispatchOutcome, MailDispatcher};
use crate::modules::smtp::manager::SmtpConnector;
use crate::modules::smtp::request::SendRequest;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[cfg(test)]
mod tests;

pub const CHECKING_NOTICE: &str = "checking for bounces, please wait";
pub const SKIPPED_NOTICE: &str = "cancelled by user, bounce check skipped";
pub const COMPLETE_NOTICE: &str = "all operations complete";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendPhase {
    Dispatching,
    AwaitingFinalCheck,
    Scanning,
    Done,
    Cancelled,
    /// An error or panic escaped one of the phases.
    Failed,
}

/// Drives one send request: dispatch, wait, then scan for bounces.
pub struct SendOrchestrator<C, M> {
    dispatcher: MailDispatcher<C>,
    scanner: BounceScanner<M>,
    bounce_check_delay: Duration,
}

impl<C, M> SendOrchestrator<C, M>
where
    C: SmtpConnector + 'static,
    M: MailboxConnector + 'static,
{
    pub fn new(
        dispatcher: MailDispatcher<C>,
        scanner: BounceScanner<M>,
        bounce_check_delay: Duration,
    ) -> Self {
        Self {
            dispatcher,
            scanner,
            bounce_check_delay,
        }
    }

    /// Runs the request to completion and returns the final phase. The
    /// transport is closed when this returns.
    pub async fn run(self: Arc<Self>, request: SendRequest, sink: ProgressSink) -> SendPhase {
        let start = Instant::now();
        let address = request.credential.address.clone();
        let task = tokio::spawn({
            let this = self.clone();
            let sink = sink.clone();
            async move { this.drive(&request, &sink).await }
        });

        let phase = match task.await {
            Ok(Ok(phase)) => phase,
            Ok(Err(e)) => {
                warn!("Send request for {address} errored, {e:#?}");
                sink.emit(ProgressLine::error(e.message())).await;
                SendPhase::Failed
            }
            Err(e) if e.is_panic() => {
                error!("Send request for {address} panicked");
                sink.emit(ProgressLine::error("internal error, the send was aborted"))
                    .await;
                SendPhase::Failed
            }
            Err(e) => {
                error!("Send request for {address} failed unexpectedly: {:?}", e);
                sink.emit(ProgressLine::error(format!("send failed unexpectedly: {}", e)))
                    .await;
                SendPhase::Failed
            }
        };
        info!(
            "Send request for {address} ended in {:?}, took {:?}",
            phase,
            start.elapsed()
        );
        phase
    }

    async fn drive(
        &self,
        request: &SendRequest,
        sink: &ProgressSink,
    ) -> BulkMailerResult<SendPhase> {
        let started_at = Utc::now();

        debug!("Phase {:?}", SendPhase::Dispatching);
        if let DispatchOutcome::Cancelled { .. } = self.dispatcher.send(request, sink).await? {
            return Ok(SendPhase::Cancelled);
        }

        debug!("Phase {:?}", SendPhase::AwaitingFinalCheck);
        sink.emit(ProgressLine::notice(CHECKING_NOTICE)).await;
        let cancelled = tokio::select! {
            biased;
            _ = request.cancellation.cancelled() => true,
            _ = sink.cancelled() => true,
            _ = tokio::time::sleep(self.bounce_check_delay) => false,
        };
        if cancelled {
            info!("Bounce check for {} skipped", request.credential.address);
            sink.emit(ProgressLine::notice(SKIPPED_NOTICE)).await;
            return Ok(SendPhase::Cancelled);
        }

        debug!("Phase {:?}", SendPhase::Scanning);
        let query = BounceQuery {
            credential: request.credential.clone(),
            since: started_at,
        };
        for line in self.scanner.scan(&query).await {
            sink.emit(line).await;
        }

        sink.emit(ProgressLine::notice(COMPLETE_NOTICE)).await;
        Ok(SendPhase::Done)
    }
}
