use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{
    AppointmentRepository, InMemoryAppointmentRepository, SupabaseAppointmentRepository,
};
use hold_cell::services::{HoldManager, HoldStore, InMemoryHoldStore, RedisHoldStore};
use schedule_cell::services::{
    InMemoryScheduleStore, ScheduleService, ScheduleStore, SupabaseScheduleStore,
};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting slot booking API server");

    // Load configuration
    let config = AppConfig::from_env();

    let (schedule_store, appointments) = durable_stores(&config);
    let hold_store = hold_store(&config).await?;

    let schedule = Arc::new(ScheduleService::new(schedule_store));
    let holds = HoldManager::from_config(hold_store, &config);
    let services = router::Services {
        schedule,
        appointments,
        holds,
        max_horizon_days: config.max_horizon_days,
    };

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(services)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn durable_stores(config: &AppConfig) -> (Arc<dyn ScheduleStore>, Arc<dyn AppointmentRepository>) {
    if config.is_database_configured() {
        info!("Using PostgREST at {}", config.supabase_url);
        let supabase = Arc::new(SupabaseClient::new(config));
        (
            Arc::new(SupabaseScheduleStore::new(supabase.clone())),
            Arc::new(SupabaseAppointmentRepository::new(supabase)),
        )
    } else {
        warn!("Database not configured, schedules and appointments live in memory");
        (
            Arc::new(InMemoryScheduleStore::new()),
            Arc::new(InMemoryAppointmentRepository::new()),
        )
    }
}

async fn hold_store(config: &AppConfig) -> anyhow::Result<Arc<dyn HoldStore>> {
    if config.is_cache_configured() {
        let store = RedisHoldStore::new(config)
            .await
            .context("connecting to the hold cache")?;
        Ok(Arc::new(store))
    } else {
        warn!("Hold cache not configured, holds are process-local");
        Ok(Arc::new(InMemoryHoldStore::new()))
    }
}
