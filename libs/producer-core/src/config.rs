use std::time::Duration;

use serde::Deserialize;

// ═══════════════════════════════════════════════════════════════
//  Producer Config
// ═══════════════════════════════════════════════════════════════

/// Конфигурация producer'а. Передаётся явно в `Producer::with_config`,
/// глобальных констант нет.
#[derive(Debug, Clone, Deserialize)]
pub struct ProducerConfig {
    /// Адреса брокеров `host:port`. Непустой список.
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Сколько `close` ждёт in-flight доставки, мс.
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,
    /// Таймаут ожидания результата одного `produce`, мс. `None` — ждать бесконечно.
    #[serde(default)]
    pub produce_timeout_ms: Option<u64>,
}

fn default_flush_timeout_ms() -> u64 {
    5000
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            flush_timeout_ms: default_flush_timeout_ms(),
            produce_timeout_ms: None,
        }
    }
}

impl ProducerConfig {
    pub fn new<S: AsRef<str>>(addresses: &[S]) -> Self {
        Self {
            addresses: addresses.iter().map(|a| a.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    pub fn produce_timeout(&self) -> Option<Duration> {
        self.produce_timeout_ms.map(Duration::from_millis)
    }
}
