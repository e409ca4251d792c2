mod analytics;
mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;

use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::{Arg, Command};
use config::AppConfig;
use database::Database;
use error::AppResult;
use handlers::AppState;
use middleware::AuthenticationMiddleware;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> AppResult<()> {
    let matches = Command::new("survey-manager")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Survey creation and response collection daemon")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file")
                .value_name("FILE"),
        )
        .get_matches();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("survey_manager=info".parse().unwrap()))
        .init();

    tracing::info!("Starting survey-manager daemon");

    // Load configuration
    let config = match matches.get_one::<String>("config") {
        Some(path) => AppConfig::load_from_file(Path::new(path))?,
        None => AppConfig::load()?,
    };

    // Initialize database
    let database = Arc::new(Database::new(&config.database.path)?);
    tracing::info!("Database initialized at {:?}", config.database.path);

    let server_addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = web::Data::new(AppState {
        database,
        start_time: SystemTime::now(),
        config: Arc::new(std::sync::RwLock::new(config)),
    });

    tracing::info!("Starting HTTP server on {}", server_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .wrap(AuthenticationMiddleware)
            .configure(routes::configure_routes)
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}
