use actix_web::{error::JsonPayloadError, web};

use crate::error::ApiError;

mod health;
mod links;


pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).configure(health::routes).configure(links::routes);
}

/// Unparseable or missing JSON bodies are validation errors like any other.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        let message = match &err {
            JsonPayloadError::ContentType => "request body must be JSON".to_owned(),
            other => format!("invalid JSON body: {other}"),
        };
        ApiError::Validation(message).into()
    })
}
