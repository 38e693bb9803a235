use clap::Parser;
use gridtable::GridtableServer;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridtable=info")),
        )
        .init();

    let args = cli::Args::parse();
    let config = args.server_config();

    let server = GridtableServer::builder().config(config.clone()).build().await?;
    let addr = server.local_addr()?;
    let status = server.status().await;
    tracing::info!(
        %addr,
        gm_grace = ?config.gm_grace,
        idle_timeout = ?config.idle_timeout,
        active_sessions = status.active_sessions,
        "Gridtable listening on ws://{addr}"
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("ctrl-c received, shutting down");
        })
        .await?;

    Ok(())
}
