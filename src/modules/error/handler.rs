// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, ApiError, ApiErrorResponse, BulkMailerError};
use poem::error::{
    MethodNotAllowedError, NotFoundError, ParseJsonError, ParseMultipartError, ParsePathError,
    ParseQueryError, SizedLimitError,
};
use poem::{IntoResponse, Response};
use poem_openapi::error::{ContentTypeError, ParseParamError, ParseRequestPayloadError};
use poem_openapi::payload::Json;

/// Maps poem's own rejections onto our codes. The code decides the status.
fn known_code(error: &poem::Error) -> Option<ErrorCode> {
    if error.is::<NotFoundError>() {
        Some(ErrorCode::ResourceNotFound)
    } else if error.is::<MethodNotAllowedError>() {
        Some(ErrorCode::MethodNotAllowed)
    } else if error.is::<SizedLimitError>() {
        Some(ErrorCode::PayloadTooLarge)
    } else if error.is::<ParsePathError>()
        || error.is::<ParseQueryError>()
        || error.is::<ParseJsonError>()
        || error.is::<ParseMultipartError>()
        || error.is::<ParseRequestPayloadError>()
        || error.is::<ContentTypeError>()
        || error.is::<ParseParamError>()
    {
        Some(ErrorCode::InvalidParameter)
    } else {
        None
    }
}

fn json_error(message: String, code: ErrorCode) -> Response {
    ApiErrorResponse::Generic(code.status(), Json(ApiError::new(message, code as u32)))
        .into_response()
}

pub async fn error_handler(error: poem::Error) -> Response {
    if error.is::<BulkMailerError>() {
        return error.into_response();
    }
    if let Some(code) = known_code(&error) {
        return json_error(error.to_string(), code);
    }
    if error.has_source() {
        // Keep poem's status, only the body shape changes.
        let mut response = json_error(error.to_string(), ErrorCode::UnhandledPoemError);
        response.set_status(error.status());
        return response;
    }
    error.into_response()
}
