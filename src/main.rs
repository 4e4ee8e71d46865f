use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use mydoctor::config::Settings;
use mydoctor::core::{EmergencyDispatcher, NearestLocator};
use mydoctor::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use mydoctor::services::{build_notifier, build_store};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting MyDoctor service...");

    // Load configuration
    let settings = Settings::load().map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let store = build_store(&settings.storage)
        .await
        .map_err(|e| startup_error("Failed to open store", e))?;

    match store.health_check().await {
        Ok(true) => info!("Store ({}) is reachable", store.backend()),
        Ok(false) | Err(_) => error!(
            "Store ({}) is not reachable yet - requests will fail until it recovers",
            store.backend()
        ),
    }

    let notifier = build_notifier(&settings.notifications)
        .map_err(|e| startup_error("Failed to initialise notifier", e))?;

    let locator = NearestLocator::new(settings.emergency.nearest_limit);
    info!("Emergency dispatch returns the {} nearest doctors", locator.limit());

    let dispatcher = EmergencyDispatcher::new(locator, notifier.clone());

    // Build application state
    let app_state = AppState::new(store, notifier, dispatcher);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
