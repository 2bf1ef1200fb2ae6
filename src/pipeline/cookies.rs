use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderMap};
use actix_web_lab::middleware::Next;
use std::collections::BTreeMap;

use crate::pipeline::RequestContext;

/// Parses every `Cookie` header into a name/value map.
///
/// Values are percent-decoded; pairs that fail to parse are skipped and the first
/// occurrence of a name wins.
pub fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for raw in headers
        .get_all(header::COOKIE)
        .filter_map(|value| value.to_str().ok())
    {
        for pair in raw.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
            match Cookie::parse_encoded(pair) {
                Ok(cookie) => {
                    cookies
                        .entry(cookie.name().to_owned())
                        .or_insert_with(|| cookie.value().to_owned());
                }
                Err(e) => tracing::debug!(error = %e, "Skipping malformed cookie pair"),
            }
        }
    }
    cookies
}

pub async fn parse_cookie_header(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let cookies = parse_cookies(req.headers());
    RequestContext::update(&req, |ctx| ctx.cookies = cookies);
    next.call(req).await
}
