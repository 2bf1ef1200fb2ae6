use actix_web::{web, HttpRequest, HttpResponse};

use crate::authentication::{bearer_token, TokenVerifier};
use crate::configuration::AuthenticationSettings;
use crate::pipeline::RequestContext;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/session", web::get().to(session));
}

#[derive(serde::Serialize)]
struct SessionStatus {
    authenticated: bool,
    user_id: Option<String>,
}

/// Reports whether the caller presents a valid access token. Never fails for a bad token.
#[tracing::instrument(name = "Inspecting session", skip_all)]
pub async fn session(
    request: HttpRequest,
    context: RequestContext,
    verifier: web::Data<dyn TokenVerifier>,
    settings: web::Data<AuthenticationSettings>,
) -> HttpResponse {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .or_else(|| {
            context
                .cookie(&settings.access_token_cookie)
                .map(str::to_owned)
        });
    let identity = token.and_then(|token| verifier.verify(&token).ok());
    HttpResponse::Ok().json(SessionStatus {
        authenticated: identity.is_some(),
        user_id: identity.map(|identity| identity.user_id),
    })
}
