#![warn(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use keepalive_service::database::open_pool;
use keepalive_service::monitoring::SystemClock;
use keepalive_service::{Config, HttpChecker, LibsqlTargetStore, Scheduler, TargetStore, register_self_target};
use tracing::{error, info};

mod error;
mod routes;
mod state;

use error::AppError;
use logger::init_tracing;
use state::AppState;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::load();
    info!("{config}");

    // Without a store there is nothing to serve or ping.
    let pool =
        open_pool(&config.database_url, config.database_auth_token.as_deref(), config.pool_size()).await?;
    info!("Database connected");

    let store: Arc<dyn TargetStore> = Arc::new(LibsqlTargetStore::new_from_pool(pool));
    run_server(&config, store).await
}

async fn run_server(config: &Config, store: Arc<dyn TargetStore>) -> Result<(), AppError> {
    let state = web::Data::new(AppState::new(store.clone(), config.default_interval_ms()));

    let server = HttpServer::new(move || {
        App::new().wrap(Logger::default()).app_data(state.clone()).configure(routes::routes)
    })
    .bind(config.listen_addr())?
    .run();
    info!("Ping service API running on port {}", config.port);

    if let Err(e) = register_self_target(store.as_ref(), &config.self_url(), config.default_interval_ms()).await {
        error!("Error ensuring self link: {e}");
    }

    let clock = Arc::new(SystemClock);
    let checker = Arc::new(HttpChecker::new(clock.clone())?);
    let scheduler = Arc::new(Scheduler::new(store, checker, clock, config.scheduler_config())).start();

    let served = server.await;
    scheduler.stop().await;

    served?;
    Ok(())
}
