// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use super::{SendOrchestrator, SendPhase, CHECKING_NOTICE, COMPLETE_NOTICE, SKIPPED_NOTICE};
use crate::modules::account::entity::Credential;
use crate::modules::bounce::scanner::BounceScanner;
use crate::modules::bounce::tests::FakeMailbox;
use crate::modules::error::BulkMailerResult;
use crate::modules::progress::ProgressSink;
use crate::modules::smtp::dispatcher::MailDispatcher;
use crate::modules::smtp::log::SendLog;
use crate::modules::smtp::manager::SmtpConnector;
use crate::modules::smtp::tests::{drain, request, FakeClient, FakeSmtp};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator<C: SmtpConnector + 'static>(
    smtp: C,
    mailbox: &FakeMailbox,
    delay: Duration,
    dir: &tempfile::TempDir,
) -> Arc<SendOrchestrator<C, FakeMailbox>> {
    let dispatcher =
        MailDispatcher::new(smtp, SendLog::new(dir.path().join("send-log.txt"))).unwrap();
    let scanner = BounceScanner::new(mailbox.clone(), "mailer-daemon", Duration::from_secs(5));
    Arc::new(SendOrchestrator::new(dispatcher, scanner, delay))
}

fn notice(message: &str) -> String {
    format!("[notice] {}", message)
}

#[tokio::test]
async fn full_run_reports_sends_then_bounces() {
    let dir = tempfile::tempdir().unwrap();
    let smtp = FakeSmtp::default();
    // Arrives after the send started.
    let mailbox = FakeMailbox::with_messages(vec![FakeMailbox::notice(
        "b@x.com",
        Utc::now() + ChronoDuration::minutes(1),
    )]);
    let request = request(&["a@x.com", "b@x.com"]);
    let (sink, receiver) = ProgressSink::channel(16, request.cancellation.clone());

    let phase = orchestrator(smtp, &mailbox, Duration::ZERO, &dir)
        .run(request, sink)
        .await;

    assert_eq!(phase, SendPhase::Done);
    assert_eq!(
        drain(receiver).await,
        vec![
            "[success] a@x.com".to_string(),
            "[success] b@x.com".to_string(),
            notice(CHECKING_NOTICE),
            "[bounced] b@x.com".to_string(),
            notice(COMPLETE_NOTICE),
        ]
    );
    mailbox.snapshot(|s| assert_eq!(s.open_sessions, 0));
}

#[tokio::test]
async fn earlier_notices_are_not_attributed_to_this_send() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = FakeMailbox::with_messages(vec![FakeMailbox::notice(
        "old@x.com",
        Utc::now() - ChronoDuration::minutes(5),
    )]);
    let request = request(&["a@x.com"]);
    let (sink, receiver) = ProgressSink::channel(16, request.cancellation.clone());

    let phase = orchestrator(FakeSmtp::default(), &mailbox, Duration::ZERO, &dir)
        .run(request, sink)
        .await;

    assert_eq!(phase, SendPhase::Done);
    let lines = drain(receiver).await;
    assert!(!lines.iter().any(|l| l.starts_with("[bounced]")));
    assert_eq!(lines.last(), Some(&notice(COMPLETE_NOTICE)));
}

#[tokio::test]
async fn cancellation_in_loop_skips_scan_with_single_notice() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = FakeMailbox::default();
    let request = request(&["a@x.com", "b@x.com", "c@x.com"]);
    let smtp = FakeSmtp {
        cancel_after: Some((1, request.cancellation.clone())),
        ..Default::default()
    };
    let (sink, receiver) = ProgressSink::channel(16, request.cancellation.clone());

    let phase = orchestrator(smtp, &mailbox, Duration::ZERO, &dir)
        .run(request, sink)
        .await;

    assert_eq!(phase, SendPhase::Cancelled);
    assert_eq!(
        drain(receiver).await,
        vec!["[success] a@x.com", "[notice] cancelled by user"]
    );
    mailbox.snapshot(|s| assert_eq!(s.logins, 0));
}

#[tokio::test]
async fn cancellation_during_wait_skips_scan() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = FakeMailbox::default();
    let request = request(&["a@x.com"]);
    let token = request.cancellation.clone();
    let (sink, mut receiver) = ProgressSink::channel(16, token.clone());

    let run = tokio::spawn(
        orchestrator(FakeSmtp::default(), &mailbox, Duration::from_secs(3600), &dir)
            .run(request, sink),
    );

    let mut lines = Vec::new();
    while let Some(line) = receiver.recv().await {
        let rendered = line.to_string();
        if rendered == notice(CHECKING_NOTICE) {
            token.cancel();
        }
        lines.push(rendered);
    }

    assert_eq!(run.await.unwrap(), SendPhase::Cancelled);
    assert_eq!(
        lines,
        vec![
            "[success] a@x.com".to_string(),
            notice(CHECKING_NOTICE),
            notice(SKIPPED_NOTICE),
        ]
    );
    mailbox.snapshot(|s| assert_eq!(s.logins, 0));
}

#[tokio::test]
async fn closed_transport_stops_the_request() {
    let dir = tempfile::tempdir().unwrap();
    let smtp = FakeSmtp::default();
    let mailbox = FakeMailbox::default();
    let request = request(&["a@x.com", "b@x.com"]);
    let token = request.cancellation.clone();
    let (sink, receiver) = ProgressSink::channel(16, token.clone());
    drop(receiver);

    let phase = orchestrator(smtp.clone(), &mailbox, Duration::ZERO, &dir)
        .run(request, sink)
        .await;

    assert_eq!(phase, SendPhase::Cancelled);
    assert!(token.is_cancelled());
    smtp.snapshot(|r| assert!(r.delivered.is_empty()));
    mailbox.snapshot(|s| assert_eq!(s.logins, 0));
}

struct PanickingSmtp;

impl SmtpConnector for PanickingSmtp {
    type Client = FakeClient;

    async fn connect(&self, _credential: &Credential) -> BulkMailerResult<FakeClient> {
        panic!("connector blew up");
    }
}

#[tokio::test]
async fn panic_becomes_single_error_line() {
    let dir = tempfile::tempdir().unwrap();
    let mailbox = FakeMailbox::default();
    let request = request(&["a@x.com"]);
    let (sink, receiver) = ProgressSink::channel(16, request.cancellation.clone());

    let phase = orchestrator(PanickingSmtp, &mailbox, Duration::ZERO, &dir)
        .run(request, sink)
        .await;

    assert_eq!(phase, SendPhase::Failed);
    let lines = drain(receiver).await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[error] "));
}
