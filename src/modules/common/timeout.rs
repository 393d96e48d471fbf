// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem::{Endpoint, Middleware, Request, Result};
use std::time::Duration;
use tracing::warn;

use crate::modules::error::code::ErrorCode;
use crate::raise_error;

pub const TIMEOUT_HEADER: &str = "X-BulkMailer-Timeout-Seconds";

/// Bounds the time until a response is produced. A streamed body keeps
/// flowing after the handler returned.
///
/// Callers may ask for a different bound through [`TIMEOUT_HEADER`], capped at `max`.
#[derive(Clone, Copy, Debug)]
pub struct Timeout {
    default: Duration,
    max: Duration,
}

impl Default for Timeout {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(60),
            max: Duration::from_secs(600),
        }
    }
}

impl Timeout {
    fn limit_for(&self, req: &Request) -> Duration {
        req.header(TIMEOUT_HEADER)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default)
            .min(self.max)
    }
}

impl<E: Endpoint> Middleware<E> for Timeout {
    type Output = TimeoutEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        TimeoutEndpoint {
            inner: ep,
            config: *self,
        }
    }
}

pub struct TimeoutEndpoint<E> {
    inner: E,
    config: Timeout,
}

impl<E: Endpoint> Endpoint for TimeoutEndpoint<E> {
    type Output = E::Output;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        let limit = self.config.limit_for(&req);
        let path = req.uri().path().to_owned();
        tokio::time::timeout(limit, self.inner.call(req))
            .await
            .unwrap_or_else(|_| {
                warn!("{} gave no response within {:?}", path, limit);
                Err(raise_error!(
                    format!("no response within {:?}, raise it with the {} header", limit, TIMEOUT_HEADER),
                    ErrorCode::RequestTimeout
                )
                .into())
            })
    }
}
