use crate::bulkmailer_version;
use crate::modules::context::AppContext;
use chrono::Local;
use poem_openapi::Object;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct BulkMailerStatus {
    /// The service uptime in milliseconds since it started.
    pub uptime_ms: i64,
    /// The timezone in which the service is operating (e.g., "+09:00").
    pub timezone: String,
    /// The version of the service currently running.
    pub version: String,
}

impl BulkMailerStatus {
    pub fn get(context: &AppContext) -> Self {
        Self {
            uptime_ms: context.uptime_ms(),
            timezone: Local::now().offset().to_string(),
            version: bulkmailer_version!().into(),
        }
    }
}
