//! `dfs`: one DFP storage server instance.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dfp_core::ServerConfig;
use dfp_server::ServerState;
use dfp_store::PieceStore;
use tokio::net::TcpListener;
use tracing::info;

/// DFP storage server.
#[derive(Parser)]
#[command(name = "dfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root directory for this server instance.
    folder: PathBuf,

    /// TCP listen port.
    port: u16,

    /// User list file (one `<username> <password>` per line).
    #[arg(long, default_value = "conf/dfs.conf")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; nothing else is printed.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args.config)?;
    let store = PieceStore::new(&args.folder);
    store.ensure_user_dirs(&config.users).await?;

    let listener = TcpListener::bind(("0.0.0.0", args.port)).await?;
    info!(
        root = %args.folder.display(),
        port = args.port,
        users = config.users.len(),
        "dfs listening"
    );

    dfp_server::serve(listener, Arc::new(ServerState { store, config })).await?;
    Ok(())
}
