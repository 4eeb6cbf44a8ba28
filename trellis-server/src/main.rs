use std::sync::Arc;
use trellis_server::{ServerConfig, demo, init_tracing, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load();
    init_tracing(&config);
    serve(config, Arc::new(demo::demo_ui)).await
}
