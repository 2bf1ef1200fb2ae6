use actix_files::NamedFile;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::web;
use actix_web_lab::middleware::Next;
use std::path::{Path, PathBuf};

use crate::error_handling::AppError;

/// Root directory the static stage serves from.
#[derive(Clone, Debug)]
pub struct PublicDir(pub PathBuf);

/// Maps a request path onto a candidate file below `root`.
///
/// Returns `None` for anything that could escape `root` or reach a hidden file.
/// A path ending in `/` maps onto that directory's `index.html`.
pub fn resolve_static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.strip_prefix('/')?;
    let mut resolved = root.to_path_buf();
    let mut segments = relative.split('/').peekable();
    while let Some(segment) = segments.next() {
        let is_last = segments.peek().is_none();
        if segment.is_empty() {
            if is_last {
                break;
            }
            return None;
        }
        if segment.starts_with('.') || segment.contains('\\') || segment.contains('\0') {
            return None;
        }
        resolved.push(segment);
    }
    if request_path.ends_with('/') {
        resolved.push("index.html");
    }
    Some(resolved)
}

async fn find_file(root: &Path, request_path: &str) -> Option<PathBuf> {
    let candidate = resolve_static_path(root, request_path)?;
    let metadata = tokio::fs::metadata(&candidate).await.ok()?;
    if metadata.is_file() {
        return Some(candidate);
    }
    if metadata.is_dir() {
        let index = candidate.join("index.html");
        let metadata = tokio::fs::metadata(&index).await.ok()?;
        return metadata.is_file().then_some(index);
    }
    None
}

/// Answers `req` with the file at `path`. A file that cannot be opened becomes an error
/// response, so it still goes through the error funnel.
async fn respond_with_file(req: ServiceRequest, path: &Path) -> ServiceResponse {
    match NamedFile::open_async(path).await {
        Ok(file) => {
            tracing::debug!(file = %path.display(), "Serving static file");
            let (request, _payload) = req.into_parts();
            let response = file.into_response(&request);
            ServiceResponse::new(request, response)
        }
        Err(e) => {
            let e = anyhow::Error::new(e)
                .context(format!("Failed to open static file {}", path.display()));
            req.error_response(AppError::Unexpected(e))
        }
    }
}

/// Serves GET/HEAD requests that hit a file in the public directory and skips the rest of the
/// pipeline for them. Misses fall through.
pub async fn serve_static(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    let is_read = req.method() == Method::GET || req.method() == Method::HEAD;
    let root = req
        .app_data::<web::Data<PublicDir>>()
        .map(|public_dir| public_dir.0.clone());

    if let (true, Some(root)) = (is_read, root) {
        if let Some(path) = find_file(&root, req.path()).await {
            return Ok(respond_with_file(req, &path).await.map_into_right_body());
        }
    }

    next.call(req)
        .await
        .map(ServiceResponse::map_into_left_body)
}
