use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::error_handling::AppError;

#[tracing::instrument(name = "Checking database connectivity", skip(pool))]
pub async fn health_check(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    sqlx::query("SELECT 1")
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            AppError::ServiceUnavailable("The database is unreachable.".into(), e.into())
        })?;
    Ok(HttpResponse::Ok().finish())
}
