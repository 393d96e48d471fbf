use crate::modules::account::entity::Credential;
use crate::modules::context::AppContext;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::ApiResult;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::OpenApi;
use std::sync::Arc;

pub struct AccountApi;

#[OpenApi(prefix_path = "/api", tag = "ApiTags::Account")]
impl AccountApi {
    /// Lists the configured sender accounts, in configuration order.
    ///
    /// Fails with a server error when the accounts configuration is malformed.
    #[oai(path = "/accounts", method = "get", operation_id = "list_accounts")]
    async fn list_accounts(
        &self,
        context: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<Vec<Credential>>> {
        Ok(Json(context.accounts()?.to_vec()))
    }
}
