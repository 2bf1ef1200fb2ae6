use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::error::PayloadError;
use actix_web::http::header::{self, HeaderValue};
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::HttpMessage;
use actix_web_lab::middleware::Next;
use futures_util::StreamExt;

use crate::configuration::SecuritySettings;
use crate::error_handling::AppError;
use crate::pipeline::RequestContext;

const DEFAULT_LIMIT: usize = 10 * 1024;

fn is_json(req: &ServiceRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| {
            let essence = essence.trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

fn declared_length(req: &ServiceRequest) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Puts `bytes` back as the request payload so extractors further in can read it.
///
/// `Content-Length` is rewritten to match the new payload.
pub(crate) fn replace_payload(req: &mut ServiceRequest, bytes: Bytes) {
    req.headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    req.headers_mut().remove(header::TRANSFER_ENCODING);
    let stream = futures_util::stream::once(async move { Ok::<_, PayloadError>(bytes) });
    req.set_payload(Payload::Stream {
        payload: Box::pin(stream),
    });
}

async fn read_limited(req: &mut ServiceRequest, limit: usize) -> Result<Bytes, AppError> {
    let mut payload = req.take_payload();
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Failed to read body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// Parses `bytes` as JSON. An empty or whitespace-only body carries no value.
pub fn parse_json_body(bytes: &[u8]) -> Result<Option<serde_json::Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| AppError::MalformedBody(e.into()))
}

/// Reads and parses JSON bodies up to the configured limit into the request context.
///
/// Other content types are left untouched.
pub async fn parse_json(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    if !is_json(&req) {
        return next
            .call(req)
            .await
            .map(ServiceResponse::map_into_left_body);
    }

    let limit = req
        .app_data::<web::Data<SecuritySettings>>()
        .map(|settings| settings.body_limit_bytes)
        .unwrap_or(DEFAULT_LIMIT);

    if declared_length(&req).map_or(false, |length| length > limit) {
        let e = AppError::PayloadTooLarge { limit };
        return Ok(req.error_response(e).map_into_right_body());
    }

    let parsed = match read_limited(&mut req, limit).await {
        Ok(bytes) => parse_json_body(&bytes).map(|body| (bytes, body)),
        Err(e) => Err(e),
    };
    let (bytes, body) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::info!(error = %e, "Rejecting request body");
            return Ok(req.error_response(e).map_into_right_body());
        }
    };

    replace_payload(&mut req, bytes);
    RequestContext::update(&req, |ctx| ctx.body = body);
    next.call(req)
        .await
        .map(ServiceResponse::map_into_left_body)
}
