use std::{num::NonZeroU32, sync::Arc, time::Instant};

use governor::{
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::InMemoryState,
    Quota, RateLimiter,
};
use poem::{
    http::header, web::RealIp, Endpoint, FromRequest, IntoResponse, Middleware, Request, Response,
    Result,
};
use tracing::{error, info, warn, Instrument};

pub type GovRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    InMemoryState,
    QuantaClock,
    NoOpMiddleware<QuantaInstant>,
>;

#[derive(Clone)]
pub struct LogRateLimiter {
    limiter: Arc<GovRateLimiter>,
}

impl Default for LogRateLimiter {
    fn default() -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(
                NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
            ))),
        }
    }
}

impl LogRateLimiter {
    /// Server errors are the cheapest to log, successful requests the most expensive.
    pub fn should_log(&self, status: u16) -> bool {
        let cost = match status {
            500_u16.. => NonZeroU32::MIN,
            400_u16..=499_u16 => NonZeroU32::new(3).unwrap_or(NonZeroU32::MIN),
            _ => NonZeroU32::new(5).unwrap_or(NonZeroU32::MIN),
        };
        matches!(self.limiter.check_n(cost), Ok(Ok(())))
    }
}

#[derive(Clone, Default)]
pub struct Tracing {
    limiter: LogRateLimiter,
}

impl<E: Endpoint> Middleware<E> for Tracing {
    type Output = TracingEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        TracingEndpoint {
            inner: ep,
            limiter: self.limiter.clone(),
        }
    }
}

/// Endpoint for the `Tracing` middleware.
pub struct TracingEndpoint<E> {
    inner: E,
    limiter: LogRateLimiter,
}

impl<E: Endpoint> Endpoint for TracingEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        let remote_addr = RealIp::from_request_without_body(&req)
            .await
            .ok()
            .and_then(|real_ip| real_ip.0)
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| req.remote_addr().to_string());
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let content_length = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok().map(|v| v.to_string()));

        let span = tracing::info_span!(
            "request",
            remote_addr = %remote_addr,
            method = %method,
            path = %path,
            content_length = ?content_length,
        );

        async move {
            let now = Instant::now();
            let res = self.inner.call(req).await;
            let duration = now.elapsed();

            match res {
                Ok(resp) => {
                    let resp = resp.into_response();
                    self.log_response(resp.status().as_u16(), duration);
                    Ok(resp)
                }
                Err(err) => {
                    self.log_response(err.status().as_u16(), duration);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl<E> TracingEndpoint<E> {
    // For streamed responses the duration covers the headers only.
    fn log_response(&self, status: u16, duration: std::time::Duration) {
        if !self.limiter.should_log(status) {
            return;
        }
        match status {
            500.. => error!(status = %status, duration = ?duration, "request completed with server error"),
            400..=499 => warn!(status = %status, duration = ?duration, "request completed with client error"),
            _ => info!(status = %status, duration = ?duration, "request completed successfully"),
        }
    }
}
