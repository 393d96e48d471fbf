// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::Credential;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::smtp::util::generate_message_id;
use crate::raise_error;
use mail_send::mail_builder::MessageBuilder;
use mail_send::smtp::message::Message;
use tokio_util::sync::CancellationToken;

/// Everything one bulk send needs. Lives for the duration of the request.
#[derive(Clone, Debug)]
pub struct SendRequest {
    pub credential: Credential,
    pub subject: String,
    pub html_body: String,
    pub recipients: Vec<String>,
    pub cancellation: CancellationToken,
}

impl SendRequest {
    pub fn new(
        credential: Credential,
        subject: impl Into<String>,
        html_body: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            credential,
            subject: subject.into(),
            html_body: html_body.into(),
            recipients,
            cancellation: CancellationToken::new(),
        }
    }

    /// Builds the message for one recipient around an already styled body.
    pub fn build_message(
        &self,
        recipient: &str,
        styled_html: &str,
    ) -> BulkMailerResult<Message<'static>> {
        let from = self.credential.address.clone();
        let body = MessageBuilder::new()
            .from(from.clone())
            .to(recipient.to_string())
            .subject(self.subject.clone())
            .html_body(styled_html.to_string())
            .message_id(generate_message_id(&from))
            .write_to_vec()
            .map_err(|e| {
                raise_error!(
                    format!("Failed to build message for {}: {}", recipient, e),
                    ErrorCode::InternalError
                )
            })?;

        Ok(Message::empty()
            .from(from)
            .to(recipient.to_string())
            .body(body))
    }
}
