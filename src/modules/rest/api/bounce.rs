// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::Credential;
use crate::modules::bounce::scanner::BounceQuery;
use crate::modules::context::AppContext;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::BulkMailerResult;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::ApiResult;
use crate::raise_error;
use chrono::{DateTime, Duration, Utc};
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use std::sync::Arc;

const DEFAULT_LOOKBACK_HOURS: i64 = 24;

#[derive(Clone, Debug, Object)]
pub struct CheckBounceRequest {
    /// The sender mailbox to inspect.
    pub sender_address: String,
    /// The mailbox password or app password.
    pub sender_secret: String,
    /// Only notifications received at or after this time (epoch milliseconds)
    /// are reported. Defaults to the last 24 hours.
    pub since: Option<i64>,
}

#[derive(Clone, Debug, Object)]
pub struct CheckBounceResponse {
    /// Rendered progress lines, `[bounced] <address>` or a single `[error] ...`.
    pub bounces: Vec<String>,
}

impl CheckBounceRequest {
    fn into_query(self, now: DateTime<Utc>) -> BulkMailerResult<BounceQuery> {
        let credential = Credential::new(self.sender_address.trim(), self.sender_secret);
        if credential.is_blank() {
            return Err(raise_error!(
                "sender_address and sender_secret are required".into(),
                ErrorCode::InvalidParameter
            ));
        }
        let since = match self.since {
            Some(millis) => DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
                raise_error!(
                    format!("since '{}' is not a valid timestamp", millis),
                    ErrorCode::InvalidParameter
                )
            })?,
            None => now - Duration::hours(DEFAULT_LOOKBACK_HOURS),
        };
        Ok(BounceQuery { credential, since })
    }
}

pub struct BounceApi;

#[OpenApi(prefix_path = "/api", tag = "ApiTags::Bounce")]
impl BounceApi {
    /// Scans the sender's inbox for delivery-failure notifications.
    ///
    /// Fetched notifications are marked as read. Scans over overlapping
    /// windows may report the same bounce again.
    #[oai(path = "/check-bounce", method = "post", operation_id = "check_bounce")]
    async fn check_bounce(
        &self,
        request: Json<CheckBounceRequest>,
        context: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<CheckBounceResponse>> {
        let query = request.0.into_query(Utc::now())?;
        let lines = context.bounce_scanner().scan(&query).await;
        Ok(Json(CheckBounceResponse {
            bounces: lines.iter().map(ToString::to_string).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(address: &str, secret: &str, since: Option<i64>) -> CheckBounceRequest {
        CheckBounceRequest {
            sender_address: address.into(),
            sender_secret: secret.into(),
            since,
        }
    }

    #[test]
    fn defaults_to_last_day() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        let query = request("a@b.com", "pw", None).into_query(now).unwrap();
        assert_eq!(query.since, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn explicit_since_in_millis() {
        let now = Utc::now();
        let query = request("a@b.com", "pw", Some(1_700_000_000_000))
            .into_query(now)
            .unwrap();
        assert_eq!(query.since.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let err = request("  ", "pw", None).into_query(Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        let err = request("a@b.com", "", None).into_query(Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }
}
