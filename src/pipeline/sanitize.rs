//! Strips query-operator keys (`$gt`, `$where`, `a.b`) out of request input before it can
//! reach a document-store query.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::web::Bytes;
use actix_web_lab::middleware::Next;
use serde_json::Value;

use crate::error_handling::AppError;
use crate::pipeline::json_body::replace_payload;
use crate::pipeline::query::{parse_query, rewrite_query};
use crate::pipeline::RequestContext;

/// True for keys an operator-aware query language would interpret.
///
/// Bracketed query keys (`user[$ne]`) are checked segment by segment.
pub fn is_prohibited_key(key: &str) -> bool {
    key.contains('.')
        || key
            .split(|c| c == '[' || c == ']')
            .any(|segment| segment.starts_with('$'))
}

/// Removes prohibited keys from every object nested in `value`. Returns the removed keys.
pub fn sanitize_value(value: &mut Value) -> Vec<String> {
    let mut removed = Vec::new();
    strip(value, &mut removed);
    removed
}

fn strip(value: &mut Value, removed: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| {
                let prohibited = is_prohibited_key(key);
                if prohibited {
                    removed.push(key.clone());
                }
                !prohibited
            });
            for nested in map.values_mut() {
                strip(nested, removed);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                strip(item, removed);
            }
        }
        _ => {}
    }
}

/// Splits query pairs into the ones kept and the keys dropped.
pub fn sanitize_query(pairs: Vec<(String, String)>) -> (Vec<(String, String)>, Vec<String>) {
    let mut removed = Vec::new();
    let kept = pairs
        .into_iter()
        .filter(|(key, _)| {
            let prohibited = is_prohibited_key(key);
            if prohibited {
                removed.push(key.clone());
            }
            !prohibited
        })
        .collect();
    (kept, removed)
}

fn sanitize_request(req: &mut ServiceRequest) -> Result<(), AppError> {
    let body = RequestContext::update(req, |ctx| {
        ctx.body.as_mut().and_then(|body| {
            let removed = sanitize_value(body);
            (!removed.is_empty()).then(|| (removed, body.clone()))
        })
    });
    if let Some((removed, body)) = body {
        tracing::warn!(keys = ?removed, "Removed prohibited keys from request body");
        let bytes = serde_json::to_vec(&body).map_err(|e| AppError::Unexpected(e.into()))?;
        replace_payload(req, Bytes::from(bytes));
    }

    let (kept, removed) = sanitize_query(parse_query(req.query_string()));
    if !removed.is_empty() {
        tracing::warn!(keys = ?removed, "Removed prohibited keys from query string");
        rewrite_query(req, &kept)?;
    }
    Ok(())
}

pub async fn sanitize(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    if let Err(e) = sanitize_request(&mut req) {
        return Ok(req.error_response(e).map_into_right_body());
    }
    next.call(req)
        .await
        .map(ServiceResponse::map_into_left_body)
}
