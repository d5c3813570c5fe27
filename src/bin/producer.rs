use linecue::config::{init_logging, load_config};
use linecue::producer::{DefaultProducer, Producer};
use linecue::transport::HttpTransport;
use std::process::ExitCode;

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

    let producer = DefaultProducer::new(
        HttpTransport::new(),
        cfg.producer.retry,
        cfg.producer.max_threads,
    );

    log::info!(
        "[System] Producer configured with {} max threads, {} retries, {:?} retry delay",
        producer.max_threads(),
        producer.retry_count(),
        producer.retry_delay()
    );

    let mut messages: Vec<String> = std::env::args().skip(1).collect();
    if messages.is_empty() {
        messages = (1..=4).map(|i| format!("Message {i}")).collect();
    }

    let mut failed = 0;
    for message in &messages {
        if !producer
            .send_async(message, &cfg.producer.endpoint)
            .await
            .is_delivered()
        {
            failed += 1;
        }
    }

    log::info!(
        "[System] All messages processed ({} delivered, {} failed)",
        messages.len() - failed,
        failed
    );

    ExitCode::SUCCESS
}
