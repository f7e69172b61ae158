use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use solver_api::{
    build_router,
    config::{Config, StorageBackend},
    state::AppState,
};
use solver_core::Orchestrator;
use solver_llm::{ChatClient, ClientFactory, ProviderConfig};
use solver_persist::{InMemoryPersistenceClient, MongoPersistenceClient, PersistenceClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting homework solver API");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // LLM client
    let mut provider = ProviderConfig::openai(config.openai_api_key.clone());
    if let Some(base_url) = &config.openai_base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    let chat_client: Arc<dyn ChatClient> = ClientFactory::create_chat_client(provider)?;

    // Persistence
    let store: Arc<dyn PersistenceClient> = match config.storage.backend {
        StorageBackend::Mongodb => {
            tracing::info!(database = %config.storage.database, "Connecting to MongoDB");
            let client =
                MongoPersistenceClient::connect(&config.mongodb_uri, &config.storage.database).await?;
            tracing::info!("MongoDB connected");
            Arc::new(client)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(InMemoryPersistenceClient::new())
        }
    };

    let orchestrator = Orchestrator::builder()
        .store(store)
        .chat_client(chat_client)
        .general(config.llm.general.clone())
        .quantitative(config.llm.quantitative.clone())
        .title(config.title_profile())
        .build()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, orchestrator));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
