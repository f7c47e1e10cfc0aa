use std::sync::Arc;

use studio_admin::config::AppConfig;
use studio_admin::services::ai::{AiClient, AiGenerate};
use studio_admin::state::AppState;
use studio_admin::views::preference::FilePreferenceStore;
use studio_admin::{db, routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Missing .env is normal outside local development.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;

    // AI assistance is optional: forms work without it.
    let ai: Option<Arc<dyn AiGenerate>> = match &config.ai {
        Some(endpoint) => match AiClient::new(endpoint) {
            Ok(client) => {
                tracing::info!(url = %endpoint.url, "AI client initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!(error = %e, "AI client could not be built; AI features disabled");
                None
            }
        },
        None => {
            tracing::warn!("AI_ENDPOINT_URL not set; AI features disabled");
            None
        }
    };

    let preferences = Arc::new(FilePreferenceStore::new(config.view_preferences_path.clone()));
    let state = AppState::new(pool, ai, preferences);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(port = config.port, "studio admin listening");
    axum::serve(listener, app).await?;
    Ok(())
}
