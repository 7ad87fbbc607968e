use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use weatherbot::config;
use weatherbot::routes;
use weatherbot::services::{select_poster, CycleRunner, CycleSettings, OpenWeatherMapClient};
use weatherbot::store;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration (an empty or invalid city list stops startup here)
    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!(
        "Rotating {} cities ({}), reset every {}h",
        config.rotation.cities.len(),
        config.rotation.cities,
        config.rotation.reset_interval_hours
    );

    let state_store = store::open(&config.state).await.map_err(|e| {
        log::error!("State store error: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    log::info!("Rotation state stored in {}", state_store.describe());

    let weather = OpenWeatherMapClient::new(&config.weather).map_err(|e| {
        log::error!("Weather client error: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    if config.weather.api_key.is_none() {
        log::warn!("WEATHER_API_KEY not set, every cycle will fail until it is configured");
    }

    let poster = select_poster(&config.posting);

    let runner = web::Data::new(CycleRunner::new(
        CycleSettings::from_config(&config),
        Arc::new(weather),
        Arc::from(poster),
        state_store,
    ));

    log::info!("Starting Weatherbot server on {}:{}", config.host, config.port);

    let host = config.host.clone();
    let port = config.port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(runner.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    // Spawn graceful shutdown handler
    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
