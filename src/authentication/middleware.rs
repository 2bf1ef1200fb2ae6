use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderMap};
use actix_web::{web, HttpMessage};
use actix_web_lab::middleware::Next;

use crate::authentication::{AuthError, Identity, TokenVerifier};
use crate::configuration::AuthenticationSettings;
use crate::error_handling::AppError;
use crate::pipeline::RequestContext;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The token a request presents: the bearer header first, then the access-token cookie.
fn presented_token(req: &ServiceRequest) -> Option<String> {
    if let Some(token) = bearer_token(req.headers()) {
        return Some(token.to_owned());
    }
    let cookie_name = req
        .app_data::<web::Data<AuthenticationSettings>>()
        .map(|settings| settings.access_token_cookie.clone())?;
    RequestContext::update(req, |ctx| ctx.cookie(&cookie_name).map(str::to_owned))
}

fn authenticate(req: &ServiceRequest) -> Result<Identity, AppError> {
    let verifier = req
        .app_data::<web::Data<dyn TokenVerifier>>()
        .ok_or_else(|| AppError::Unexpected(anyhow::anyhow!("No token verifier registered")))?;
    let token = presented_token(req).ok_or(AuthError::MissingToken);
    match token.and_then(|token| verifier.verify(&token)) {
        Ok(identity) => Ok(identity),
        Err(AuthError::MissingToken) => Err(AppError::Unauthorized(
            "You are not logged in! Please log in to get access.".into(),
        )),
        Err(e) => {
            tracing::info!(error.cause_chain = ?e, "Access token rejected");
            Err(AppError::Forbidden(
                "Invalid or expired token. Please log in again.".into(),
            ))
        }
    }
}

/// Gate for protected route groups: the inner service only runs for verified callers.
///
/// The identity is recorded on the request context and as request data, so handlers can
/// take either `RequestContext` or `web::ReqData<Identity>`.
pub async fn reject_unauthenticated(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    match authenticate(&req) {
        Ok(identity) => {
            RequestContext::update(&req, |ctx| ctx.identity = Some(identity.clone()));
            req.extensions_mut().insert(identity);
            next.call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        }
        Err(e) => Ok(req.error_response(e).map_into_right_body()),
    }
}
