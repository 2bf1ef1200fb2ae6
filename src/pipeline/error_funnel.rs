use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{web, HttpResponse};

use crate::configuration::Environment;
use crate::error_handling::AppError;

const GENERIC_SERVER_ERROR: &str = "Something went very wrong!";

/// The JSON body every error response is rewritten into.
#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub status: String,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorEnvelope {
    /// Builds the envelope for `response`. Server-side details only leave the process
    /// outside of production.
    pub fn for_response<B>(response: &HttpResponse<B>, environment: Environment) -> Self {
        let status = response.status();
        let error = response.error();

        let message = match error {
            Some(error) if status.is_client_error() => error.to_string(),
            Some(error) => match error.as_error::<AppError>() {
                // upstream failures explain themselves, anything else is opaque
                Some(AppError::ServiceUnavailable(message, _))
                    if environment == Environment::Production =>
                {
                    message.clone()
                }
                _ if environment == Environment::Production => GENERIC_SERVER_ERROR.to_string(),
                _ => error.to_string(),
            },
            None => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };
        let detail = match (environment, error) {
            (Environment::Local, Some(error)) => Some(format!("{:?}", error)),
            _ => None,
        };

        Self {
            status: if status.is_server_error() {
                "error".into()
            } else {
                "fail".into()
            },
            status_code: status.as_u16(),
            message,
            detail,
        }
    }
}

fn funnel<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let environment = res
        .request()
        .app_data::<web::Data<Environment>>()
        .map(|environment| *environment.get_ref())
        .unwrap_or(Environment::Production);
    let envelope = ErrorEnvelope::for_response(res.response(), environment);

    if envelope.status_code >= StatusCode::INTERNAL_SERVER_ERROR.as_u16() {
        tracing::error!(
            status = envelope.status_code,
            error.cause_chain = ?res.response().error(),
            "Request failed"
        );
    }

    let body = serde_json::to_string(&envelope).unwrap_or_else(|_| {
        format!(
            r#"{{"status":"{}","status_code":{},"message":"{}"}}"#,
            envelope.status, envelope.status_code, GENERIC_SERVER_ERROR
        )
    });
    let res = res.map_body(|head, _| {
        head.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        BoxBody::new(body)
    });
    Ok(ErrorHandlerResponse::Response(res.map_into_right_body()))
}

/// The single terminal handler for every 4xx and 5xx response.
pub fn error_funnel<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().default_handler(funnel)
}
