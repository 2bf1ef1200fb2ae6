use actix_cors::Cors;

use crate::configuration::SecuritySettings;

/// Builds the CORS policy: only the configured origins, any request header.
///
/// Requests from any other origin are still served, just without
/// `Access-Control-Allow-*` headers, leaving the browser to enforce the policy.
pub fn cors_policy(settings: &SecuritySettings) -> Cors {
    let allowed_origins = settings.allowed_origins.clone();
    Cors::default()
        .allowed_origin_fn(move |origin, _request_head| {
            origin
                .to_str()
                .map(|origin| allowed_origins.iter().any(|allowed| allowed == origin))
                .unwrap_or(false)
        })
        .allowed_methods(["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"])
        .allow_any_header()
        .block_on_origin_mismatch(false)
}
