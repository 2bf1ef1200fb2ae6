use actix_web::{HttpMessage, HttpRequest, HttpResponse};

use crate::error_handling::AppError;
use crate::pipeline::OriginalUrl;

/// Catch-all for anything no route group claimed.
pub async fn not_found(request: HttpRequest) -> Result<HttpResponse, AppError> {
    // report the target as the client sent it, not as the query stages rewrote it
    let original_url = request
        .extensions()
        .get::<OriginalUrl>()
        .map(|url| url.0.clone())
        .or_else(|| {
            request
                .uri()
                .path_and_query()
                .map(|target| target.as_str().to_owned())
        })
        .unwrap_or_else(|| request.path().to_owned());
    Err(AppError::NotFound(original_url))
}
