use actix_web::{HttpResponse, Responder, get};
use serde_json::json;

macros_utils::routes! {
    route health_route,
}

/// Liveness check, also the url the self target pings.
#[get("/health")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
