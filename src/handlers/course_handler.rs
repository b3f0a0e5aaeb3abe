use actix_multipart::Multipart;
use actix_web::{post, web, HttpRequest, HttpResponse};
use futures::StreamExt;

use crate::{
    app_state::AppState, errors::AppError, middleware::get_request_id, services::UploadMeta,
};

pub const FILE_FIELD: &str = "file";

/// Accepts a document in the `file` multipart field and answers with the
/// generated course.
#[post("/test-upload")]
pub async fn upload_course(
    req: HttpRequest,
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let request_id = get_request_id(&req).unwrap_or_default();

    while let Some(field) = payload.next().await {
        let field = field?;
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let meta = UploadMeta {
            filename: field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default()
                .to_string(),
            content_type: field.content_type().map(|m| m.to_string()),
        };
        log::info!("[{}] Generating course from '{}'", request_id, meta.filename);

        let course = state.course_service.generate_course(field, meta).await?;
        return Ok(HttpResponse::Ok().json(course));
    }

    Err(AppError::ValidationError(format!(
        "Multipart field `{}` is missing",
        FILE_FIELD
    )))
}
