use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use programlog::config::Config;
use programlog::db;
use programlog::gateway::{HttpGateway, LocalGateway, ProgramGateway};
use programlog::handlers::{api, programs};
use programlog::lifecycle::ControllerRegistry;
use programlog::migrations::run_migrations;
use programlog::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "programlog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();

    tracing::info!("Connecting to database: {}", config.database_url);
    let pool = db::create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let local_gateway = LocalGateway::new(pool.clone());

    let (gateway, service_mode): (Arc<dyn ProgramGateway>, &'static str) =
        match config.http_gateway() {
            Some(gateway_config) => {
                tracing::info!("Using remote program service at {}", gateway_config.base_url);
                (Arc::new(HttpGateway::new(gateway_config)?), "remote")
            }
            None => {
                tracing::info!("Using local program service");
                (Arc::new(local_gateway.clone()), "local")
            }
        };

    let programs_state = programs::ProgramsState {
        registry: ControllerRegistry::new(gateway, config.link_poll_policy()),
        default_program_id: config.default_program_id.clone(),
        service_mode,
    };
    let api_state = api::ApiState {
        gateway: local_gateway,
    };

    let app = routes::create_router(programs_state, api_state);

    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
