use actix_web::{middleware, web, App, HttpServer};
use heart_fit::config::Settings;
use heart_fit::routes::{self, AppState};
use heart_fit::services::DatasetLoader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // Initialize logging; LOG_LEVEL / LOG_FORMAT override the config file
    let (config_level, config_format) = match &settings {
        Ok(s) => (s.logging.level.clone(), s.logging.format.clone()),
        Err(_) => ("info".to_string(), "json".to_string()),
    };
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(config_level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(config_format);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting Heart Fit service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, format!("Configuration error: {}", e))
    })?;

    info!("Configuration loaded successfully");

    let dataset = DatasetLoader::new(&settings.dataset.path);
    if dataset.path().is_file() {
        info!("Dataset: {}", dataset.path().display());
    } else {
        error!(
            "Dataset {} not found; fit requests will fail until it exists",
            dataset.path().display()
        );
    }

    let fitter = settings.fitting.fitter_config();
    info!(
        "Fitter configured: num_points={}, initial_guess={:?}, max_iterations={}, ftol={:e}",
        fitter.num_points,
        fitter.optimizer.initial_guess,
        fitter.optimizer.max_iterations,
        fitter.optimizer.ftol
    );

    let app_state = AppState { dataset, fitter };
    let cors_settings = settings.cors.clone();
    info!("CORS allowed origins: {:?}", cors_settings.allowed_origins);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(routes::build_cors(&cors_settings))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
