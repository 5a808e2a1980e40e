//! DarkChat TUI entry point.

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use clap::Parser;
use darkchat_client::{ClientConfig, SessionStore};
use darkchat_tui::{Runtime, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// DarkChat terminal client
#[derive(Parser, Debug)]
#[command(name = "darkchat")]
#[command(about = "Terminal client for DarkChat")]
#[command(version)]
struct Args {
    /// Event socket base URL
    #[arg(short, long, env = "DARKCHAT_SERVER", default_value = "http://localhost:80")]
    server: String,

    /// REST API base URL
    #[arg(short, long, env = "DARKCHAT_API", default_value = "http://localhost:3000")]
    api: String,

    /// File holding the persisted session
    ///
    /// Defaults to `session.cbor` in the platform config directory.
    #[arg(long, value_name = "PATH", env = "DARKCHAT_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, env = "DARKCHAT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log file. The terminal belongs to the UI, so logs never go to stderr.
    #[arg(long, value_name = "PATH", env = "DARKCHAT_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.server.clone(),
            api_url: self.api.clone(),
            session_path: self
                .session_file
                .clone()
                .unwrap_or_else(ClientConfig::default_session_path),
        }
    }
}

fn default_log_file() -> PathBuf {
    dirs::data_dir()
        .map_or_else(|| PathBuf::from("."), |dir| dir.join("darkchat"))
        .join("darkchat.log")
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.log_file.clone().unwrap_or_else(default_log_file);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).with_target(true))
        .with(filter)
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.client_config();
    tracing::info!(server = %config.server_url, api = %config.api_url, "starting");

    let session = SessionStore::open(&config.session_path)?;
    let driver = TerminalDriver::new(&config, session)?;

    Ok(Runtime::new(driver).run().await?)
}
