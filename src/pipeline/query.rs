use actix_web::dev::ServiceRequest;
use actix_web::http::uri::{PathAndQuery, Uri};
use actix_web::HttpMessage;

use crate::error_handling::AppError;

/// The request target exactly as the client sent it, before any stage rewrote the query.
#[derive(Clone, Debug)]
pub struct OriginalUrl(pub String);

pub fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

pub fn encode_query(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Replaces the query string of `req`, keeping the path untouched.
pub fn rewrite_query(req: &mut ServiceRequest, pairs: &[(String, String)]) -> Result<(), AppError> {
    let original = req.uri().to_string();
    if req.extensions().get::<OriginalUrl>().is_none() {
        let target = req
            .uri()
            .path_and_query()
            .map(|target| target.as_str().to_owned())
            .unwrap_or(original);
        req.extensions_mut().insert(OriginalUrl(target));
    }

    let query = encode_query(pairs);
    let target = if query.is_empty() {
        req.path().to_owned()
    } else {
        format!("{}?{}", req.path(), query)
    };
    let path_and_query: PathAndQuery = target
        .parse()
        .map_err(|_| AppError::BadRequest("Malformed request target.".into()))?;

    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    let uri = Uri::from_parts(parts)
        .map_err(|_| AppError::BadRequest("Malformed request target.".into()))?;

    req.match_info_mut().get_mut().update(&uri);
    req.head_mut().uri = uri;
    Ok(())
}
