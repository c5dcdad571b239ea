// Route exports
pub mod fit;

use crate::config::CorsSettings;
use actix_cors::Cors;
use actix_web::{error, http::StatusCode, web, HttpResponse};

pub use fit::{AppState, FitFailure};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(fit::configure);
}

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Body extractor settings: any content type, errors as `JsonError`
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(handle_json_payload_error)
}

/// CORS policy from settings
///
/// A wildcard origin allows any origin without credentials; otherwise only
/// the listed origins are allowed and credentials are supported.
pub fn build_cors(settings: &CorsSettings) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if settings.allows_any() {
        return cors.allow_any_origin();
    }

    settings
        .allowed_origins
        .iter()
        .fold(cors.supports_credentials(), |cors, origin| cors.allowed_origin(origin))
}
