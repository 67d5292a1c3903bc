use std::sync::Arc;

mod catalog;
mod config;
mod handler;
mod http;
mod logger;
mod server;

use catalog::{Catalog, FileBackend};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path_from_args(std::env::args().skip(1))?;
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime; `server.workers` overrides the default of one thread per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;

    let backend = FileBackend::new(&cfg.storage.path);
    if cfg.storage.create_if_missing && backend.ensure_exists().await? {
        logger::log_catalog_created(backend.path());
    }

    let listener = server::bind_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg, Catalog::new(backend)));
    logger::log_server_start(&addr, &cfg);

    let shutdown = async {
        match server::shutdown_signal().await {
            Ok(signal) => signal,
            Err(e) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
                std::future::pending().await
            }
        }
    };

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_server(listener, state, shutdown))
        .await?;
    Ok(())
}

/// `-c <path>` / `--config <path>`, path given without extension
fn config_path_from_args(mut args: impl Iterator<Item = String>) -> Result<String, String> {
    let mut path = config::DEFAULT_CONFIG_PATH.to_string();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                path = args
                    .next()
                    .ok_or_else(|| format!("Missing value for {arg}"))?;
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    Ok(path)
}
