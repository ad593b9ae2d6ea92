mod broker;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use producer_api::{
    BrokerAddress, ConnectionError, Connector, DeliveryEvent, DeliveryNotifier, FlushSummary,
    Message, TransportError, TransportSession,
};

pub use broker::{MemoryBroker, StoredRecord};

// ═══════════════════════════════════════════════════════════════
//  MemoryTransportConfig
// ═══════════════════════════════════════════════════════════════

fn default_partitions() -> u32 {
    1
}
fn default_auto_create_topics() -> bool {
    true
}
fn default_max_records() -> usize {
    100_000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryTransportConfig {
    /// Число партиций у каждого topic'а.
    #[serde(default = "default_partitions")]
    pub partitions: u32,
    /// Искусственная задержка доставки, мс.
    #[serde(default)]
    pub latency_ms: u64,
    /// Создавать topic при первой записи. Иначе — ошибка UnknownTopic.
    #[serde(default = "default_auto_create_topics")]
    pub auto_create_topics: bool,
    /// Topic'и, существующие с самого начала.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Ёмкость ring-buffer'а одной партиции.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for MemoryTransportConfig {
    fn default() -> Self {
        Self {
            partitions: default_partitions(),
            latency_ms: 0,
            auto_create_topics: default_auto_create_topics(),
            topics: Vec::new(),
            max_records: default_max_records(),
        }
    }
}

impl MemoryTransportConfig {
    pub fn from_json(config_json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(config_json)
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryConnector
// ═══════════════════════════════════════════════════════════════

/// Connector к in-process брокеру. Все сессии пишут в один `MemoryBroker`.
pub struct MemoryConnector {
    broker: Arc<MemoryBroker>,
    latency: Duration,
}

impl MemoryConnector {
    pub fn new(config: MemoryTransportConfig) -> Self {
        Self {
            broker: Arc::new(MemoryBroker::new(&config)),
            latency: Duration::from_millis(config.latency_ms),
        }
    }

    pub fn from_json(config_json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(MemoryTransportConfig::from_json(config_json)?))
    }

    pub fn broker(&self) -> Arc<MemoryBroker> {
        self.broker.clone()
    }
}

impl Connector for MemoryConnector {
    fn open_session(&self, addresses: &[BrokerAddress]) -> Result<Box<dyn TransportSession>, ConnectionError> {
        if addresses.is_empty() {
            return Err(ConnectionError::NoAddresses);
        }
        tracing::debug!(
            brokers = %addresses.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(","),
            "memory transport session opened"
        );
        Ok(Box::new(MemorySession {
            broker: self.broker.clone(),
            latency: self.latency,
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }))
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemorySession
// ═══════════════════════════════════════════════════════════════

/// Сессия: каждое сообщение доставляет отдельная задача на `TaskTracker`.
/// Задача ждёт `latency`, пишет в брокер и кладёт результат в слот.
struct MemorySession {
    broker: Arc<MemoryBroker>,
    latency: Duration,
    tracker: TaskTracker,
    token: CancellationToken,
    closed: AtomicBool,
}

impl TransportSession for MemorySession {
    fn submit(&self, message: Message, notify: DeliveryNotifier) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::closed());
        }

        let broker = self.broker.clone();
        let latency = self.latency;
        let token = self.token.clone();
        self.tracker.spawn(async move {
            if !latency.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(latency) => {}
                    _ = token.cancelled() => {
                        // notifier dropped: the slot resolves without an outcome
                        tracing::debug!(topic = %message.topic, "delivery abandoned");
                        return;
                    }
                }
            }
            let event = match broker.append(message).await {
                Ok(report) => DeliveryEvent::Delivered(report),
                Err(e) => DeliveryEvent::Failed(e),
            };
            notify.notify(event);
        });
        Ok(())
    }

    fn flush_and_close(&self, timeout: Duration) -> Pin<Box<dyn Future<Output = FlushSummary> + Send + '_>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            self.tracker.close();
            let pending = self.tracker.len();

            if tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok() {
                tracing::debug!(delivered = pending, "memory transport session flushed");
                return FlushSummary { delivered: pending, abandoned: 0 };
            }

            let abandoned = self.tracker.len();
            self.token.cancel();
            self.tracker.wait().await;
            tracing::debug!(abandoned, "memory transport session closed with pending deliveries");
            FlushSummary {
                delivered: pending.saturating_sub(abandoned),
                abandoned,
            }
        })
    }
}
