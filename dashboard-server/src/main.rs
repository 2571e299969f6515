use dashboard_server::api;
use dashboard_server::config::Config;
use dashboard_server::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dashboard_server=info,loyalty_core=info,asaas_client=info,tower_http=info".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting dashboard-server (env: {})", config.environment);

    let state = AppState::from_config(&config)?;

    // Periodic cashback expiry sweep
    let store = state.store.clone();
    tokio::spawn(async move {
        use loyalty_core::store::LedgerStore;
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match store.expire_balances(shared::util::now_millis()).await {
                Ok(0) => {}
                Ok(expired) => tracing::info!(expired, "Expired cashback balances"),
                Err(e) => tracing::error!(%e, "Cashback expiry sweep failed"),
            }
        }
    });

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("dashboard-server HTTP listening on {http_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
