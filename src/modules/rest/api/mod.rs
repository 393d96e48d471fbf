// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use account::AccountApi;
use bounce::BounceApi;
use log::LogApi;
use poem_openapi::{OpenApiService, Tags};

use crate::bulkmailer_version;

pub mod account;
pub mod bounce;
pub mod log;

#[derive(Tags)]
pub enum ApiTags {
    Account,
    Bounce,
    Log,
}

type BulkMailerOpenApi = (AccountApi, BounceApi, LogApi);

pub fn create_openapi_service() -> OpenApiService<BulkMailerOpenApi, ()> {
    OpenApiService::new(
        (AccountApi, BounceApi, LogApi),
        "BulkMailer API",
        bulkmailer_version!(),
    )
}
