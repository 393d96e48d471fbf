use crate::modules::context::{status::BulkMailerStatus, AppContext};
use poem::{handler, web::Data, web::Json, IntoResponse};
use std::sync::Arc;

#[handler]
pub async fn get_status(context: Data<&Arc<AppContext>>) -> impl IntoResponse {
    Json(BulkMailerStatus::get(&context))
}
