use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{GatewayConfig, ServeArgs};
use crate::error::ServerError;
use ingest_api::RecordPublisher;
use ingest_engine::Ingestor;
use publisher_kafka::{KafkaPublisher, KafkaPublisherConfig};
use publisher_memory::MemoryPublisher;

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("ingest-server starting");

    // --- Required settings: no partial startup without a broker ---
    let settings = args.broker_settings()?;

    let config = match &args.config {
        Some(path) => {
            let config = GatewayConfig::load(path)?;
            tracing::info!(config = %path, "loaded config");
            config
        }
        None => GatewayConfig::default(),
    };

    // --- Publisher ---
    let publisher: Arc<dyn RecordPublisher> = if args.dry_run {
        tracing::warn!(max_records = config.dry_run_max_records, "dry run, records stay in memory");
        Arc::new(MemoryPublisher::new().with_max_records(config.dry_run_max_records))
    } else {
        Arc::new(KafkaPublisher::new(&KafkaPublisherConfig {
            brokers: settings.brokers.clone(),
            properties: config.kafka.clone(),
            flush_timeout: Duration::from_millis(config.flush_timeout_ms),
        })?)
    };

    tracing::info!(
        brokers = %settings.brokers,
        topic = %settings.topic,
        max_line_length = config.max_line_length,
        body_limit = config.body_limit,
        "connecting"
    );

    let ingestor = Ingestor::new(publisher.clone(), settings.topic)
        .with_max_line_length(config.max_line_length);
    let app = ingest_api_server::router(Arc::new(ingestor), config.body_limit);

    // --- API server ---
    let token = CancellationToken::new();
    let api_token = token.clone();
    let listen = args.listen.clone();
    let mut api_handle = tokio::spawn(async move {
        ingest_api_server::run(&listen, app, api_token).await
    });

    tracing::info!("server ready");

    tokio::select! {
        result = &mut api_handle => {
            // The server only stops on its own when it failed.
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(ServerError::Api(e)),
                Err(e) => return Err(ServerError::Api(format!("api task: {e}"))),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutting down...");
            token.cancel();
            match api_handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "api server error"),
                Err(e) => tracing::error!(error = %e, "api task panicked"),
            }
        }
    }

    // Drain records still queued in the producer
    if let Err(e) = publisher.flush().await {
        tracing::error!(error = ?e, "publisher flush error");
    }

    tracing::info!("shutdown complete");
    Ok(())
}
