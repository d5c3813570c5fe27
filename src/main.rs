use linecue::config::{init_logging, load_config};
use linecue::server;
use std::process::ExitCode;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = match load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&cfg.logging) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let (addr, server) = match server::serve(&cfg.broker, shutdown_signal()) {
        Ok(v) => v,
        Err(e) => {
            log::error!("could not bind {}: {e}", cfg.broker.addr);
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Server running on http://{} (store: {})",
        addr,
        cfg.broker.store_path
    );

    if let Err(e) = server.await {
        log::error!("server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
