use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const LOG_LEVELS: [&str; 5] = ["debug", "info", "warn", "error", "nope"];

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "trellis-demo", version, about = "Server-driven widget UI over websockets")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "TRELLIS_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(short, long, env = "TRELLIS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// debug, info, warn, error, or nope to disable logging
    #[arg(long, env = "TRELLIS_LOG", default_value = "info", value_parser = LOG_LEVELS)]
    pub log_level: String,

    /// How often ops produced outside of event handling are pushed to clients
    #[arg(long = "flush-ms", env = "TRELLIS_FLUSH_MS", default_value_t = 50)]
    pub flush_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            flush_interval_ms: 50,
        }
    }
}

impl ServerConfig {
    /// Parse flags and environment, reading `.env` first when present.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    pub fn logging_enabled(&self) -> bool {
        self.log_level != "nope"
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &ServerConfig) {
    if !config.logging_enabled() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
