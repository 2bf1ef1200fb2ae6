use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use actix_web::web;
use actix_web_lab::middleware::Next;

use crate::configuration::SecuritySettings;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';\
font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';\
img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';\
style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

const HARDENING_HEADERS: [(&str, &str); 11] = [
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("cross-origin-opener-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=15552000; includeSubDomains",
    ),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Writes the hardening headers into `headers`, replacing any value set further in.
///
/// Cross-Origin-Resource-Policy is only sent when `cross_origin_resource_policy` is set.
pub fn apply_security_headers(headers: &mut HeaderMap, cross_origin_resource_policy: Option<&str>) {
    for (name, value) in HARDENING_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    if let Some(policy) = cross_origin_resource_policy {
        if let Ok(value) = HeaderValue::from_str(policy) {
            headers.insert(HeaderName::from_static("cross-origin-resource-policy"), value);
        }
    }
    headers.remove("x-powered-by");
}

/// First stage: hardening headers on every response, errors included.
pub async fn security_headers(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let cross_origin_resource_policy = req
        .app_data::<web::Data<SecuritySettings>>()
        .and_then(|settings| settings.cross_origin_resource_policy.clone());
    let mut response = next.call(req).await?;
    apply_security_headers(
        response.headers_mut(),
        cross_origin_resource_policy.as_deref(),
    );
    Ok(response)
}
