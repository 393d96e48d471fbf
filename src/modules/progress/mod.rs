// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Tag carried by every progress line. The rendered prefix is how clients
/// tell outcomes apart, there is no separate error channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Success,
    Failure,
    Bounced,
    Notice,
    Error,
}

impl ProgressKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ProgressKind::Success => "success",
            ProgressKind::Failure => "failure",
            ProgressKind::Bounced => "bounced",
            ProgressKind::Notice => "notice",
            ProgressKind::Error => "error",
        }
    }

    pub fn is_outcome(&self) -> bool {
        matches!(self, ProgressKind::Success | ProgressKind::Failure)
    }
}

/// One reported event of a send or scan.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProgressLine {
    pub kind: ProgressKind,
    pub message: String,
    /// Present for success, failure and bounced lines.
    pub recipient: Option<String>,
}

impl ProgressLine {
    pub fn success(recipient: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Success,
            message: String::new(),
            recipient: Some(recipient.into()),
        }
    }

    pub fn failure(recipient: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Failure,
            message: reason.into(),
            recipient: Some(recipient.into()),
        }
    }

    pub fn bounced(recipient: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Bounced,
            message: String::new(),
            recipient: Some(recipient.into()),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Notice,
            message: message.into(),
            recipient: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Error,
            message: message.into(),
            recipient: None,
        }
    }

    /// Renders the line with its trailing newline, as written to the stream.
    pub fn render_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind.tag())?;
        match (&self.recipient, self.message.is_empty()) {
            (Some(recipient), true) => write!(f, " {}", recipient),
            (Some(recipient), false) => write!(f, " {}: {}", recipient, self.message),
            (None, _) => write!(f, " {}", self.message),
        }
    }
}

/// Producer half of the progress transport.
///
/// Lines are delivered in emission order. Once the consumer is gone the
/// request's cancellation token is cancelled, so the producer stops at its
/// next suspension point. Dropping the last clone closes the transport.
#[derive(Clone, Debug)]
pub struct ProgressSink {
    sender: mpsc::Sender<ProgressLine>,
    cancellation: CancellationToken,
}

impl ProgressSink {
    pub fn channel(
        capacity: usize,
        cancellation: CancellationToken,
    ) -> (Self, mpsc::Receiver<ProgressLine>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                cancellation,
            },
            receiver,
        )
    }

    pub async fn emit(&self, line: ProgressLine) {
        if let Err(e) = self.sender.send(line).await {
            debug!("progress consumer is gone, dropping line: {}", e.0);
            self.cancellation.cancel();
        }
    }

    /// True once the request was cancelled or the consumer went away.
    pub fn cancellation_requested(&self) -> bool {
        if self.sender.is_closed() {
            self.cancellation.cancel();
        }
        self.cancellation.is_cancelled()
    }

    /// Resolves when the request is cancelled or the consumer goes away.
    pub async fn cancelled(&self) {
        tokio::select! {
            _ = self.cancellation.cancelled() => {},
            _ = self.sender.closed() => self.cancellation.cancel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_tag_prefix_convention() {
        assert_eq!(ProgressLine::success("a@b.com").to_string(), "[success] a@b.com");
        assert_eq!(
            ProgressLine::failure("a@b.com", "550 mailbox unavailable").to_string(),
            "[failure] a@b.com: 550 mailbox unavailable"
        );
        assert_eq!(ProgressLine::bounced("a@b.com").to_string(), "[bounced] a@b.com");
        assert_eq!(
            ProgressLine::notice("all operations complete").render_line(),
            "[notice] all operations complete\n"
        );
        assert_eq!(ProgressLine::error("boom").to_string(), "[error] boom");
    }

    #[tokio::test]
    async fn preserves_emission_order() {
        let (sink, mut receiver) = ProgressSink::channel(8, CancellationToken::new());
        sink.emit(ProgressLine::success("1@x.com")).await;
        sink.emit(ProgressLine::failure("2@x.com", "nope")).await;
        sink.emit(ProgressLine::notice("done")).await;
        drop(sink);

        let mut lines = Vec::new();
        while let Some(line) = receiver.recv().await {
            lines.push(line.to_string());
        }
        assert_eq!(
            lines,
            vec!["[success] 1@x.com", "[failure] 2@x.com: nope", "[notice] done"]
        );
    }

    #[tokio::test]
    async fn dropped_consumer_cancels_request() {
        let token = CancellationToken::new();
        let (sink, receiver) = ProgressSink::channel(8, token.clone());
        assert!(!sink.cancellation_requested());
        drop(receiver);
        assert!(sink.cancellation_requested());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn emit_into_closed_transport_cancels() {
        let token = CancellationToken::new();
        let (sink, receiver) = ProgressSink::channel(8, token.clone());
        drop(receiver);
        sink.emit(ProgressLine::notice("nobody listens")).await;
        assert!(token.is_cancelled());
    }
}
