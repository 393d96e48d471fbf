use crate::modules::context::AppContext;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::ApiResult;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use std::sync::Arc;

#[derive(Clone, Debug, Object)]
pub struct SendLogResponse {
    /// The full send log, one `<timestamp> [success|failure] <address>` line per outcome.
    pub logs: String,
}

pub struct LogApi;

#[OpenApi(prefix_path = "/api", tag = "ApiTags::Log")]
impl LogApi {
    /// Returns the contents of the durable send log.
    #[oai(path = "/log", method = "get", operation_id = "get_send_log")]
    async fn get_send_log(
        &self,
        context: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<SendLogResponse>> {
        let logs = context.send_log().read().await?;
        Ok(Json(SendLogResponse { logs }))
    }
}
