// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use super::error::BulkMailerError;
use poem::error::ResponseError;
use poem::Body;
use poem::{http::StatusCode, Response};
use tracing::error;

pub mod log;
pub mod timeout;

impl ResponseError for BulkMailerError {
    fn status(&self) -> StatusCode {
        self.code().status()
    }

    fn as_response(&self) -> Response
    where
        Self: std::error::Error + Send + Sync + 'static,
    {
        let BulkMailerError::Generic {
            message,
            location,
            code,
        } = self;
        error!(
            error_code = *code as u32,
            error_message = %message,
            error_location = ?location
        );

        let payload = serde_json::json!({
            "code": *code as u32,
            "message": message.to_string(),
        });
        Response::builder()
            .status(self.status())
            .content_type("application/json; charset=utf-8")
            .body(Body::from_string(payload.to_string()))
    }
}
