use actix_web::{HttpResponse, delete, get, patch, post, web};
use keepalive_service::normalize::{ValidationError, interval_seconds_to_ms, normalize_url};
use keepalive_service::{NewTarget, TargetPatch};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route list_links,
    route create_link,
    route update_link,
    route enable_link,
    route disable_link,
    route delete_link,
}

/// Interval in seconds, as a JSON number or a numeric string.
/// Fractions are truncated to whole seconds.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Whole(u64),
    Fractional(f64),
    Text(String),
}

impl Seconds {
    fn value(&self) -> Result<u64, ValidationError> {
        match self {
            Seconds::Whole(seconds) => Ok(*seconds),
            Seconds::Fractional(seconds) => truncate_seconds(*seconds),
            Seconds::Text(text) => {
                let text = text.trim();
                match text.parse::<u64>() {
                    Ok(seconds) => Ok(seconds),
                    Err(_) => text
                        .parse::<f64>()
                        .map_err(|_| ValidationError::InvalidInterval)
                        .and_then(truncate_seconds),
                }
            }
        }
    }
}

fn truncate_seconds(seconds: f64) -> Result<u64, ValidationError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ValidationError::InvalidInterval);
    }
    let whole = seconds.trunc();
    // Past u64 the value cannot be a valid interval anyway.
    if whole >= u64::MAX as f64 {
        return Err(ValidationError::InvalidInterval);
    }
    Ok(whole as u64)
}

#[derive(Debug, Deserialize)]
struct CreateLinkRequest {
    url: Option<String>,
    interval: Option<Seconds>,
}

#[derive(Debug, Deserialize)]
struct UpdateLinkRequest {
    url: Option<String>,
    enabled: Option<bool>,
    interval: Option<Seconds>,
}

#[get("/links")]
async fn list_links(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let targets = state.store.list().await?;
    Ok(HttpResponse::Ok().json(targets))
}

#[post("/links")]
async fn create_link(
    state: web::Data<AppState>,
    body: web::Json<CreateLinkRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let url = normalize_url(body.url.as_deref().unwrap_or_default())?;

    // Absent or zero falls back to the process default.
    let check_interval_ms = match body.interval.as_ref().map(Seconds::value).transpose()? {
        None | Some(0) => state.default_interval_ms,
        Some(seconds) => interval_seconds_to_ms(seconds)?,
    };

    let target = state.store.create(NewTarget::new(url, check_interval_ms)).await?;
    info!(target_id = %target.id, url = %target.url, "Link added");
    Ok(HttpResponse::Created().json(target))
}

#[patch("/links/{id}")]
async fn update_link(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<UpdateLinkRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let patch = TargetPatch {
        url: body.url.as_deref().map(normalize_url).transpose()?,
        enabled: body.enabled,
        check_interval_ms: body
            .interval
            .as_ref()
            .map(|interval| interval.value().and_then(interval_seconds_to_ms))
            .transpose()?,
    };

    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".into()));
    }

    let target = state.store.update(&id, patch).await?.ok_or(ApiError::NotFound)?;
    info!(target_id = %target.id, url = %target.url, "Link updated");
    Ok(HttpResponse::Ok().json(target))
}

#[patch("/links/{id}/enable")]
async fn enable_link(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    toggle_link(&state, &id, true).await
}

#[patch("/links/{id}/disable")]
async fn disable_link(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    toggle_link(&state, &id, false).await
}

async fn toggle_link(state: &AppState, id: &str, enabled: bool) -> Result<HttpResponse, ApiError> {
    let target = state.store.set_enabled(id, enabled).await?.ok_or(ApiError::NotFound)?;
    info!(target_id = %target.id, enabled, "Link toggled");
    Ok(HttpResponse::Ok().json(target))
}

/// Idempotent: deleting an unknown id is still a 204.
#[delete("/links/{id}")]
async fn delete_link(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    if state.store.delete(&id).await? {
        info!(target_id = %id, "Link deleted");
    } else {
        debug!(target_id = %id, "Delete of unknown link ignored");
    }
    Ok(HttpResponse::NoContent().finish())
}
