// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::Credential;
use crate::modules::context::AppContext;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::progress::{ProgressLine, ProgressSink};
use crate::modules::recipient::extract_recipients;
use crate::modules::smtp::request::SendRequest;
use crate::raise_error;
use poem::http::header;
use poem::web::{Data, Multipart};
use poem::{handler, Body, Response};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct SendEmailForm {
    subject: Option<String>,
    html_body: Option<String>,
    spreadsheet: Option<Vec<u8>>,
    sender_address: Option<String>,
    sender_secret: Option<String>,
}

#[derive(Debug)]
struct SendEmailParts {
    credential: Credential,
    subject: String,
    html_body: String,
    spreadsheet: Vec<u8>,
}

impl SendEmailForm {
    async fn read(multipart: &mut Multipart, max_bytes: usize) -> BulkMailerResult<Self> {
        let mut form = Self::default();
        let mut total = 0usize;
        while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            // The legacy field names are still sent by older front ends.
            match name.as_str() {
                "subject" => form.subject = Some(field.text().await.map_err(invalid_form)?),
                "htmlBody" | "body" => {
                    form.html_body = Some(field.text().await.map_err(invalid_form)?)
                }
                "spreadsheetFile" | "file" => {
                    form.spreadsheet = Some(field.bytes().await.map_err(invalid_form)?)
                }
                "senderAddress" | "senderEmail" => {
                    form.sender_address = Some(field.text().await.map_err(invalid_form)?)
                }
                "senderSecret" | "senderPassword" => {
                    form.sender_secret = Some(field.text().await.map_err(invalid_form)?)
                }
                other => debug!("ignoring unknown form field '{}'", other),
            }
            total = form.size();
            if total > max_bytes {
                return Err(raise_error!(
                    format!("Request form exceeds {} bytes", max_bytes),
                    ErrorCode::PayloadTooLarge
                ));
            }
        }
        debug!("Read send form of {} bytes", total);
        Ok(form)
    }

    fn size(&self) -> usize {
        [&self.subject, &self.html_body, &self.sender_address, &self.sender_secret]
            .iter()
            .filter_map(|field| field.as_ref().map(String::len))
            .sum::<usize>()
            + self.spreadsheet.as_ref().map_or(0, Vec::len)
    }

    fn into_parts(self) -> BulkMailerResult<SendEmailParts> {
        let (Some(subject), Some(html_body), Some(spreadsheet)) =
            (self.subject, self.html_body, self.spreadsheet)
        else {
            return Err(raise_error!(
                "subject, htmlBody and spreadsheetFile are required".into(),
                ErrorCode::InvalidParameter
            ));
        };
        let credential = Credential::new(
            self.sender_address.unwrap_or_default().trim(),
            self.sender_secret.unwrap_or_default(),
        );
        if credential.is_blank() {
            return Err(raise_error!(
                "senderAddress and senderSecret are required".into(),
                ErrorCode::InvalidParameter
            ));
        }
        Ok(SendEmailParts {
            credential,
            subject,
            html_body,
            spreadsheet,
        })
    }
}

fn invalid_form(e: impl std::fmt::Display) -> crate::modules::error::BulkMailerError {
    raise_error!(
        format!("Unable to read multipart form: {}", e),
        ErrorCode::InvalidParameter
    )
}

/// Accepts a bulk send and answers with a plain-text stream of progress lines.
///
/// Form problems are rejected with a JSON error before streaming starts. Once
/// the stream is open every problem is reported in-band as an `[error]` line.
#[handler]
pub async fn send_email(
    context: Data<&Arc<AppContext>>,
    mut multipart: Multipart,
) -> poem::Result<Response> {
    let max_bytes = context.settings.bulkmailer_max_request_bytes;
    let parts = SendEmailForm::read(&mut multipart, max_bytes)
        .await?
        .into_parts()?;
    let buffer = context.progress_buffer();

    let recipients = match extract_recipients(&parts.spreadsheet) {
        Ok(recipients) => recipients,
        Err(e) => {
            warn!("Rejecting send from {}: {}", parts.credential.address, e);
            let (sink, receiver) = ProgressSink::channel(buffer, CancellationToken::new());
            sink.emit(ProgressLine::error(e.message())).await;
            return Ok(progress_response(receiver));
        }
    };

    info!(
        "Starting send of {} messages from {}",
        recipients.len(),
        parts.credential.address
    );
    let request = SendRequest::new(
        parts.credential,
        parts.subject,
        parts.html_body,
        recipients,
    );
    let (sink, receiver) = ProgressSink::channel(buffer, request.cancellation.clone());
    tokio::spawn(context.orchestrator().run(request, sink));
    Ok(progress_response(receiver))
}

/// Streams each line as soon as it is emitted. The stream ends when every
/// producer handle is dropped.
fn progress_response(receiver: mpsc::Receiver<ProgressLine>) -> Response {
    let lines = futures::stream::unfold(receiver, |mut receiver| async move {
        receiver
            .recv()
            .await
            .map(|line| (Ok::<_, std::io::Error>(line.render_line()), receiver))
    });
    Response::builder()
        .content_type("text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Body::from_bytes_stream(lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> SendEmailForm {
        SendEmailForm {
            subject: Some("Hello".into()),
            html_body: Some("<p>Hi</p>".into()),
            spreadsheet: Some(vec![1, 2, 3]),
            sender_address: Some(" me@example.com ".into()),
            sender_secret: Some("app-password".into()),
        }
    }

    #[test]
    fn complete_form_yields_parts() {
        let parts = complete_form().into_parts().unwrap();
        assert_eq!(parts.credential.address, "me@example.com");
        assert_eq!(parts.subject, "Hello");
        assert_eq!(parts.spreadsheet, vec![1, 2, 3]);
    }

    #[test]
    fn missing_spreadsheet_is_rejected() {
        let mut form = complete_form();
        form.spreadsheet = None;
        let err = form.into_parts().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn size_counts_every_field() {
        assert_eq!(complete_form().size(), 5 + 9 + 3 + 16 + 12);
    }

    #[test]
    fn blank_secret_is_rejected() {
        let mut form = complete_form();
        form.sender_secret = Some(String::new());
        assert!(form.into_parts().is_err());
    }

    #[tokio::test]
    async fn streams_rendered_lines_until_sink_dropped() {
        let (sink, receiver) = ProgressSink::channel(4, CancellationToken::new());
        let response = progress_response(receiver);
        assert_eq!(
            response.content_type(),
            Some("text/plain; charset=utf-8")
        );

        let producer = tokio::spawn(async move {
            sink.emit(ProgressLine::success("a@example.com")).await;
            sink.emit(ProgressLine::failure("b@example.com", "550 no such user"))
                .await;
            sink.emit(ProgressLine::notice("all operations complete")).await;
        });

        let body = response.into_body().into_string().await.unwrap();
        producer.await.unwrap();
        assert_eq!(
            body,
            "[success] a@example.com\n\
             [failure] b@example.com: 550 no such user\n\
             [notice] all operations complete\n"
        );
    }
}
