use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderValue};
use actix_web::web;
use actix_web_lab::middleware::Next;

use crate::configuration::SecuritySettings;

/// Marks responses to allow-listed origins as credentialed.
///
/// Runs ahead of the CORS policy so preflight responses get the header too.
pub async fn credentials(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let allowed = match (
        req.headers()
            .get(header::ORIGIN)
            .and_then(|origin| origin.to_str().ok()),
        req.app_data::<web::Data<SecuritySettings>>(),
    ) {
        (Some(origin), Some(settings)) => settings.is_allowed_origin(origin),
        _ => false,
    };

    let mut response = next.call(req).await?;
    if allowed {
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    }
    Ok(response)
}
