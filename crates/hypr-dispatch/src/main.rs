//! hypr-dispatch daemon
//!
//! Listens to Hyprland's event socket and dispatches events to handler modules.

use std::io;

use anyhow::Result;
use clap::Parser;
use hypr_dispatch::startup::{load_config, log_filter, write_check, DEFAULT_CONFIG_PATH};
use hypr_dispatch::{
    default_socket_base, get_socket_path, Dispatcher, EventListener, HandlerLoader,
    ReconnectPolicy,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hypr-dispatchd")]
#[command(about = "Dispatch Hyprland events to handler modules")]
#[command(version)]
struct Args {
    /// Path to configuration file [default: ~/.config/hypr-dispatch/config.kdl]
    #[arg(short, long)]
    config: Option<String>,

    /// Validate configuration, handlers and the socket path, then exit without connecting
    #[arg(long)]
    check: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_path) = load_config(args.config.as_deref(), DEFAULT_CONFIG_PATH)?;

    // Logs go to stderr; stdout belongs to handlers such as print-json
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), config.global.log_level))
        .with_writer(io::stderr)
        .init();

    match &config_path {
        Some(path) => tracing::info!("Loaded configuration from {}", path.display()),
        None => tracing::info!("No configuration file found, using defaults"),
    }

    let loader = match &config.handlers {
        Some(specs) => HandlerLoader::from_specs(specs)?,
        None => HandlerLoader::defaults(),
    };

    let socket_base = config
        .global
        .socket_base
        .clone()
        .unwrap_or_else(default_socket_base);

    if args.check {
        return write_check(
            &mut io::stdout().lock(),
            &config,
            config_path.as_deref(),
            &loader,
            get_socket_path(&socket_base),
        );
    }

    let mut dispatcher = Dispatcher::new();
    let loaded = loader.load_into(&mut dispatcher);
    if dispatcher.is_empty() {
        tracing::warn!("No handlers registered, events will be ignored");
    } else {
        tracing::debug!(modules = ?loaded, kinds = ?dispatcher.kinds(), "Handlers ready");
    }

    let socket_path = get_socket_path(&socket_base)?;
    tracing::info!("Connecting to {}", socket_path.display());

    let listener = EventListener::connect(socket_path)
        .await?
        .with_policy(ReconnectPolicy::from(config.reconnect));

    listener.run(&dispatcher).await?;

    Ok(())
}
