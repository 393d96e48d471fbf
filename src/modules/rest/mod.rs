// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::common::log::Tracing;
use crate::modules::common::timeout::{Timeout, TIMEOUT_HEADER};
use crate::modules::context::AppContext;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::handler::error_handler;
use crate::modules::error::BulkMailerResult;
use crate::modules::rest::public::status::get_status;
use crate::modules::utils::shutdown::shutdown_signal;
use crate::raise_error;

use super::error::ApiErrorResponse;
use api::create_openapi_service;
use poem::listener::TcpListener;
use poem::middleware::{CatchPanic, Cors};
use poem::{get, post, Endpoint, EndpointExt, Route, Server};
use send::send_email;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod api;
pub mod public;
pub mod send;

pub type ApiResult<T, E = ApiErrorResponse> = std::result::Result<T, E>;

const DESCRIPTION: &str = r#"
    BulkMailer sends one styled HTML message per spreadsheet recipient through the
    sender's own SMTP account and streams a line per outcome back to the caller.

    - Send requests stream `[success]`, `[failure]`, `[bounced]`, `[notice]` and `[error]` lines.
    - After sending, the sender's inbox is checked for delivery-failure notices.
    - Every outcome is appended to a durable send log.
"#;

/// Builds the full HTTP application around the shared context.
pub fn create_route(context: Arc<AppContext>) -> impl Endpoint {
    let api_service = create_openapi_service()
        .description(DESCRIPTION)
        .summary("Bulk HTML mail over SMTP with IMAP bounce reconciliation");

    let swagger = api_service.swagger_ui();
    let spec_json = api_service.spec_endpoint();

    let open_api_route = Route::new()
        .nest_no_strip("/api", api_service)
        .with(Timeout::default());

    let mut cors_origins = context.settings.bulkmailer_cors_origins.clone();
    if cors_origins.is_empty() {
        cors_origins = ["*".to_string()].into_iter().collect();
    }

    let cors = Cors::new()
        .allow_origins(cors_origins)
        .allow_methods(vec!["GET", "POST", "OPTIONS", "HEAD"])
        .allow_headers(vec!["Content-Type", TIMEOUT_HEADER])
        .max_age(86400);

    Route::new()
        .nest("/api-docs/swagger", swagger)
        .nest("/api-docs/spec.json", spec_json)
        .at("/api/status", get(get_status))
        .at("/api/send-email", post(send_email))
        .nest_no_strip("/api", open_api_route)
        .with(Tracing::default())
        .with(cors)
        .with(CatchPanic::new())
        .data(context)
        .catch_all_error(error_handler)
}

pub async fn start_http_server(context: Arc<AppContext>) -> BulkMailerResult<()> {
    let port = context.settings.bulkmailer_http_port;
    let listener = TcpListener::bind((context.settings.bulkmailer_bind_ip.clone(), port));

    let server = Server::new(listener)
        .name("BulkMailer API Service")
        .idle_timeout(Duration::from_secs(60))
        .run_with_graceful_shutdown(
            create_route(context),
            shutdown_signal(),
            Some(Duration::from_secs(5)),
        );
    info!("BulkMailer API Service is now running on port {}.", port);
    server
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

#[cfg(test)]
mod tests;
