use cubage_service::api::{self, ApiState};
use cubage_service::catalog::InMemoryCatalog;
use cubage_service::config::AppConfig;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();
    init_logging();
    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    tracing::info!("🚀 Cubage service starting...");
    let catalog = match InMemoryCatalog::load_json_file(app_config.catalog.path()) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!("❌ {}", err);
            std::process::exit(1);
        }
    };

    let state = ApiState::from_config(catalog, &app_config);
    if let Err(err) = api::start_api_server(&app_config, state).await {
        tracing::error!(
            "❌ API server on {} terminated with an error: {}",
            app_config.api.socket_addr(),
            err
        );
        std::process::exit(1);
    }
}
