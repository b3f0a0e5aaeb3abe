use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, models::dto::HealthResponse};

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::healthy(&state.config.gemini_model))
}
