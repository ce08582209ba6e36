use jwt_auth::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "jwt_auth=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = match AppState::init().await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "startup failed");
            return Err(e);
        }
    };
    tracing::info!(
        ttl_secs = app_state.keys.ttl().as_secs(),
        issuer = %app_state.config.jwt.issuer,
        "token signing configured"
    );

    let host = app_state.config.host.clone();
    let port = app_state.config.port;
    app::serve(app::build_app(app_state), &host, port).await
}
