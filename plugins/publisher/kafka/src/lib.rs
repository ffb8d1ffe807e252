use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;

use ingest_api::{IngestError, Record, RecordPublisher};

/// Connection settings for [`KafkaPublisher`].
#[derive(Debug, Clone)]
pub struct KafkaPublisherConfig {
    /// `bootstrap.servers`, comma separated.
    pub brokers: String,
    /// Extra librdkafka properties, applied after `bootstrap.servers`.
    pub properties: BTreeMap<String, String>,
    /// Upper bound for draining the local queue at shutdown.
    pub flush_timeout: Duration,
}

/// Publisher backed by an rdkafka `FutureProducer`.
///
/// `publish` enqueues into the producer's local queue and returns as soon as
/// librdkafka accepts or rejects the message. The delivery report is dropped.
pub struct KafkaPublisher {
    producer: FutureProducer,
    flush_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(config: &KafkaPublisherConfig) -> Result<Self, IngestError> {
        let mut client = ClientConfig::new();
        client.set("bootstrap.servers", &config.brokers);
        for (key, value) in &config.properties {
            client.set(key, value);
        }

        let producer: FutureProducer = client
            .create()
            .map_err(|e| IngestError::config(format!("kafka producer: {e}")))?;

        tracing::info!(
            brokers = %config.brokers,
            properties = config.properties.len(),
            "kafka producer created"
        );

        Ok(Self {
            producer,
            flush_timeout: config.flush_timeout,
        })
    }
}

impl RecordPublisher for KafkaPublisher {
    fn publish(
        &self,
        topic: &str,
        record: Record,
    ) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + '_>> {
        let outcome = self
            .producer
            .send_result(FutureRecord::<(), [u8]>::to(topic).payload(record.as_bytes()))
            .map(drop)
            .map_err(|(e, _)| IngestError::broker(e.to_string()));
        Box::pin(async move { outcome })
    }

    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), IngestError>> + Send + '_>> {
        let producer = self.producer.clone();
        let timeout = Timeout::After(self.flush_timeout);
        Box::pin(async move {
            // librdkafka flush blocks the calling thread
            tokio::task::spawn_blocking(move || producer.flush(timeout))
                .await
                .map_err(|e| IngestError::broker(format!("flush task: {e}")))?
                .map_err(|e| IngestError::broker(format!("flush: {e}")))
        })
    }
}
