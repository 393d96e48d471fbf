// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, BulkMailerResult};
use crate::raise_error;
use entity::Credential;

pub mod entity;

/// Parses the configured sender accounts.
///
/// The value is a JSON array of `{"address": .., "secret": ..}` objects; the
/// `email`/`pass` key names are accepted as well. A missing value yields an
/// empty list.
pub fn load_accounts(raw: Option<&str>) -> BulkMailerResult<Vec<Credential>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(raw) => raw,
    };
    serde_json::from_str::<Vec<Credential>>(raw).map_err(|e| {
        raise_error!(
            format!("Sender accounts configuration is not valid JSON: {}", e),
            ErrorCode::MissingConfiguration
        )
    })
}
