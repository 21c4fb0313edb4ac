//! Local live-preview server for markdown documents.
//!
//! Serves one markdown file (or a directory of them), re-rendering from disk
//! on every request and holding `/watch` long-polls open until the file
//! changes, so the browser refreshes without a client-side build step or a
//! websocket.
//!
//! # Usage
//!
//! ```bash
//! # Preview a single file
//! mdserve README.md
//!
//! # Serve a directory of documents, each at its own path
//! mdserve docs/ --port 9000 --open
//! ```

mod router;

use clap::Parser;
use mdserve_core::render::{RenderOptions, Renderer};
use router::{ServeMode, ServerState};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// How long a `/watch` request stays open before returning empty-handed.
const WATCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[clap(name = "mdserve")]
struct Args {
    /// Markdown file to preview, or a directory to serve documents from.
    path: PathBuf,

    /// Port to listen on.
    #[clap(long, default_value_t = 8080)]
    port: u16,

    /// Open the preview in the default browser once the server is up.
    #[clap(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mdserve=info".parse().unwrap())
                .add_directive("mdserve_core=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let mode = ServeMode::detect(&args.path)?;
    tracing::info!(?mode, "Serving");

    let renderer = Renderer::new(RenderOptions::preview())?;
    let state = ServerState::new(renderer, mode, WATCH_TIMEOUT);

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP webserver running. Access it at: http://localhost:{}/", args.port);

    if args.open {
        if let Err(error) = webbrowser::open(&format!("http://localhost:{}/", args.port)) {
            tracing::error!(?error, "Failed to open the browser");
        }
    }

    axum::serve(listener, router::build_router(state)).await?;

    Ok(())
}
