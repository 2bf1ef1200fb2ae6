use actix_web::{web, HttpResponse};

use crate::authentication::Identity;
use crate::pipeline::RequestContext;
use crate::routes::not_found;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/profile")
            .route(web::get().to(get_profile))
            .route(web::post().to(update_profile))
            .default_service(web::route().to(not_found)),
    );
}

#[tracing::instrument(
    name = "Fetching the caller's profile",
    skip(identity),
    fields(user_id = %identity.user_id)
)]
pub async fn get_profile(identity: web::ReqData<Identity>) -> HttpResponse {
    HttpResponse::Ok().json(identity.into_inner())
}

/// Echoes the sanitized update alongside the verified caller.
#[tracing::instrument(
    name = "Updating the caller's profile",
    skip(identity, context),
    fields(user_id = %identity.user_id)
)]
pub async fn update_profile(
    identity: web::ReqData<Identity>,
    context: RequestContext,
) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "user": identity.into_inner(),
        "update": context.body,
    }))
}
