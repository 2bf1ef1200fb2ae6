use actix_web::{web, HttpResponse};

use crate::error_handling::AppError;
use crate::pipeline::RequestContext;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(submit_form));
}

/// Acknowledges a form submission by echoing the sanitized payload.
#[tracing::instrument(name = "Receiving a form submission", skip_all)]
pub async fn submit_form(context: RequestContext) -> Result<HttpResponse, AppError> {
    match context.body {
        Some(body @ serde_json::Value::Object(_)) => Ok(HttpResponse::Created().json(
            serde_json::json!({
                "status": "received",
                "data": body,
            }),
        )),
        _ => Err(AppError::BadRequest(
            "Form submissions must be a JSON object.".into(),
        )),
    }
}
