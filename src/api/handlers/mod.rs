pub mod modes;
pub mod stats;

use actix_web::HttpResponse;
use serde_json::json;

use crate::utils::error::AppError;

/// JSON error body, 400 for caller mistakes and 500 for everything else
pub(crate) fn error_response(context: &str, e: &AppError) -> HttpResponse {
    let body = json!({
        "status": "error",
        "message": format!("{}: {}", context, e)
    });
    if e.is_client_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}
