use crate::config::ServerConfig;
use crate::session::run_session;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use trellis_ui::SharedUi;

/// Builds the widget tree for one new connection.
pub type UiFactory = Arc<dyn Fn() -> SharedUi + Send + Sync>;

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(config: ServerConfig, factory: UiFactory) -> Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("trellis server listening on ws://{}/ws", listener.local_addr()?);
    serve_with_listener(listener, factory, config.flush_interval()).await
}

/// Accept loop over an already bound listener. Every connection gets its
/// own tree from `factory` and its own task.
pub async fn serve_with_listener(
    listener: TcpListener,
    factory: UiFactory,
    flush_every: Duration,
) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };
        let factory = factory.clone();
        tokio::spawn(async move {
            handle_connection(stream, peer, factory, flush_every).await;
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    factory: UiFactory,
    flush_every: Duration,
) {
    let _ = stream.set_nodelay(true);
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            debug!(%peer, error = %err, "websocket handshake failed");
            return;
        }
    };
    info!(%peer, "session opened");
    match run_session(ws, factory(), flush_every).await {
        Ok(()) => info!(%peer, "session ended"),
        Err(err) => warn!(%peer, error = %err, "session aborted"),
    }
}
