use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tether_api::{
    build_router,
    config::{Config, StorageBackend},
    state::AppState,
};
use tether_attachments::LocalAttachmentStore;
use tether_engine::ChatEngine;
use tether_llm::ProviderFactory;
use tether_observability::TracingSink;
use tether_persist::{InMemoryPersistenceClient, PersistenceClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting tether API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let persistence = connect_persistence(&config).await?;

    let providers = ProviderFactory::registry(config.provider_configs())?;
    tracing::info!(providers = ?providers.ids(), "Providers registered");

    let engine = ChatEngine::builder()
        .persistence(persistence)
        .attachments(Arc::new(LocalAttachmentStore::new(
            config.attachments.local_root.clone(),
        )))
        .providers(providers)
        .config(config.engine.clone())
        .telemetry(Arc::new(TracingSink))
        .build()?;

    spawn_retention(engine.clone(), config.maintenance.retention_interval_secs);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, engine));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_persistence(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory persistence; data is lost on restart");
            Ok(Arc::new(InMemoryPersistenceClient::new()))
        }
        #[cfg(feature = "mongodb")]
        StorageBackend::MongoDb => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("MONGODB_URI is required for the mongodb backend"))?;
            tracing::info!("Connecting to MongoDB");
            let client =
                tether_persist::MongoPersistenceClient::connect(uri, &config.storage.database).await?;
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "mongodb"))]
        StorageBackend::MongoDb => {
            anyhow::bail!("storage backend 'mongodb' requires building with --features mongodb")
        }
    }
}

fn spawn_retention(engine: ChatEngine, interval_secs: u64) {
    if interval_secs == 0 {
        tracing::info!("Background retention disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            if let Err(e) = engine.run_retention().await {
                tracing::error!("Retention run failed: {}", e);
            }
        }
    });
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
