use linecue::config::{init_logging, load_config};
use linecue::consumer::{Consumer, DefaultConsumer};
use linecue::transport::HttpTransport;
use std::process::ExitCode;
use std::sync::Arc;

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

    let consumer = Arc::new(DefaultConsumer::new(
        HttpTransport::new(),
        cfg.consumer.max_threads,
        cfg.consumer.poll_interval(),
    ));

    log::info!(
        "[System] Consumer configured with {} max threads, polling every {:?}",
        consumer.max_threads(),
        consumer.poll_interval()
    );

    let endpoint = Arc::new(cfg.consumer.endpoint);
    let handles: Vec<_> = (0..cfg.consumer.workers)
        .map(|_| {
            let consumer = Arc::clone(&consumer);
            let endpoint = Arc::clone(&endpoint);
            tokio::spawn(async move { consumer.consume_async(&endpoint).await })
        })
        .collect();

    let mut code = ExitCode::SUCCESS;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                log::error!("[System] Consumer stopped: {e}");
                code = ExitCode::FAILURE;
            }
            Err(e) => {
                log::error!("[System] Consumer task failed: {e}");
                code = ExitCode::FAILURE;
            }
        }
    }

    log::info!("[System] All messages processed");

    code
}
