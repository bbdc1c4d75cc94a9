use anyhow::Result;
use clap::Parser;
use quant_agent::{api, cli::AgentArgs, AppState};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Port to run the web server on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Interface to bind
    #[arg(long, env = "AGENT_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[command(flatten)]
    agent: AgentArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quant_agent=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Starting quant agent service");
    info!("Initial capital: {:.2}", args.agent.initial_capital);
    info!("Symbol: {}", args.agent.symbol);

    let agent = args.agent.build_agent()?;
    let state = Arc::new(AppState::new(agent));

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any));

    let addr = SocketAddr::new(args.host, args.port);
    info!("Server running at http://{}", addr);
    info!("Trigger a cycle with: curl -X POST http://{}/cycle", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
