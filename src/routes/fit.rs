use crate::core::{FitError, FitReport, FitterConfig, HeartFitter};
use crate::models::{build_feature_collection, ErrorResponse, FitHeartRequest, FitSummary, HealthResponse};
use crate::services::{DatasetError, DatasetLoader};
use actix_web::{web, HttpResponse, Responder};
use geojson::JsonValue;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dataset: DatasetLoader,
    pub fitter: FitterConfig,
}

/// Errors that can end a fit request
#[derive(Debug, Error)]
pub enum FitFailure {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Fit(#[from] FitError),
}

/// Configure the fitting routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/fit-heart", web::post().to(fit_heart))
        .route("/api/fit-heart", web::post().to(fit_heart));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let dataset_present = state.dataset.path().is_file();
    let status = if dataset_present { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Load the dataset and fit the heart onto it
///
/// Runs synchronously; callers on an async runtime should move it onto a
/// blocking thread.
pub fn run_fit(
    dataset: &DatasetLoader,
    config: FitterConfig,
) -> Result<(FitReport, Option<JsonValue>), FitFailure> {
    let point_set = dataset.load()?;
    let report = HeartFitter::new(config).fit(&point_set.points)?;
    Ok((report, point_set.crs))
}

/// Fit heart endpoint
///
/// POST /fit-heart
///
/// Request body: any JSON value. Objects may carry overrides:
/// ```json
/// {
///   "numPoints": 200,
///   "initialGuess": { "scale": 0.1, "rotation": 0.01, "tx": 2.5, "ty": 2.5 },
///   "maxIterations": 1000
/// }
/// ```
///
/// Responds with a GeoJSON FeatureCollection of the matched nodes.
async fn fit_heart(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let request = match FitHeartRequest::from_body(body.into_inner()) {
        Ok(request) => request,
        Err(e) => {
            tracing::info!("Rejected fit-heart body: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid request".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };

    if let Err(errors) = request.validate() {
        tracing::info!("Validation failed for fit-heart request: field_errors={:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let fit_id = Uuid::new_v4();
    let config = request.apply_to(&state.fitter);
    let dataset = state.dataset.clone();

    tracing::info!(
        "Starting fit {}: dataset={}, num_points={}, overrides={}",
        fit_id,
        dataset.path().display(),
        config.num_points,
        request.has_overrides()
    );

    let started = Instant::now();
    let outcome = web::block(move || run_fit(&dataset, config)).await;

    let (report, crs) = match outcome {
        Ok(Ok(fitted)) => fitted,
        Ok(Err(FitFailure::Dataset(e))) => {
            tracing::error!("Fit {} could not load dataset: {}", fit_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load dataset".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
        Ok(Err(FitFailure::Fit(e))) => {
            tracing::error!("Fit {} failed: {}", fit_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Fit failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
        Err(e) => {
            tracing::error!("Fit {} worker failed: {}", fit_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Fit failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let summary = FitSummary::from_report(fit_id, &report);
    if !summary.success {
        tracing::warn!(
            "Fit {} did not converge ({:?}); returning best parameters found",
            fit_id,
            summary.termination
        );
    }

    tracing::info!(
        "Fit {} done in {} ms: cost={:.6e}, rms={:.6e}, iterations={}, termination={:?}",
        fit_id,
        started.elapsed().as_millis(),
        summary.cost,
        summary.rms_distance,
        summary.iterations,
        summary.termination
    );

    match build_feature_collection(&report, &summary, crs.as_ref()) {
        Ok(collection) => HttpResponse::Ok()
            .content_type("application/geo+json")
            .json(collection),
        Err(e) => {
            tracing::error!("Fit {} could not be serialized: {}", fit_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Serialization failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
