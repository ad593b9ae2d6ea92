use clap::Args;
use serde::Deserialize;

use producer_core::{ProducerConfig, RetryPolicy};
use transport_memory::MemoryTransportConfig;

use super::error::DemoError;

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub brokers: Option<Vec<String>>,
    pub topic: Option<String>,
    pub count: Option<usize>,
    pub prefix: Option<String>,
    pub flush_timeout_ms: Option<u64>,
    pub produce_timeout_ms: Option<u64>,
    pub transport: Option<MemoryTransportConfig>,
    pub retry: Option<RetryPolicy>,
}

pub fn load_config(path: &str) -> Result<Config, DemoError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| DemoError::Config(format!("cannot read config {path}: {e}")))?;
    parse_config(&content).map_err(|e| DemoError::Config(format!("bad config {path}: {e}")))
}

fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug, Default)]
pub struct DemoArgs {
    /// Путь к producer.toml (необязательный)
    #[arg(long, default_value = "producer.toml", env = "PRODUCER_DEMO_CONFIG")]
    pub config: String,

    /// Адреса брокеров через запятую (host:port)
    #[arg(long, env = "PRODUCER_BROKERS", value_delimiter = ',')]
    pub brokers: Option<Vec<String>>,

    /// Topic для отправки
    #[arg(long, env = "PRODUCER_TOPIC")]
    pub topic: Option<String>,

    /// Число сообщений
    #[arg(long, env = "PRODUCER_COUNT")]
    pub count: Option<usize>,

    /// Префикс сообщения: "<prefix> <i>"
    #[arg(long, env = "PRODUCER_PREFIX")]
    pub prefix: Option<String>,

    /// Сколько close ждёт недоставленные сообщения, мс
    #[arg(long, env = "PRODUCER_FLUSH_TIMEOUT_MS")]
    pub flush_timeout_ms: Option<u64>,

    /// Задержка доставки in-memory транспорта, мс
    #[arg(long, env = "PRODUCER_LATENCY_MS")]
    pub latency_ms: Option<u64>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Итоговая конфигурация после мержа: producer.toml < env/CLI
#[derive(Debug)]
pub struct Effective {
    pub producer: ProducerConfig,
    pub topic: String,
    pub count: usize,
    pub prefix: String,
    pub transport: MemoryTransportConfig,
    pub retry: Option<RetryPolicy>,
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9091".into(), "localhost:9092".into()]
}

impl Effective {
    pub fn new(args: &DemoArgs) -> Result<Self, DemoError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };
        Self::merge(args, cfg)
    }

    pub(crate) fn merge(args: &DemoArgs, cfg: Config) -> Result<Self, DemoError> {
        let addresses = args.brokers.clone().or(cfg.brokers).unwrap_or_else(default_brokers);
        if addresses.is_empty() {
            return Err(DemoError::Config("broker list is empty".into()));
        }

        let topic = args.topic.clone().or(cfg.topic).unwrap_or_else(|| "my-awesome-topic".into());
        if topic.is_empty() {
            return Err(DemoError::Config("topic must not be empty".into()));
        }

        let mut transport = cfg.transport.unwrap_or_default();
        if let Some(latency) = args.latency_ms {
            transport.latency_ms = latency;
        }

        let mut producer = ProducerConfig::new(&addresses);
        if let Some(ms) = args.flush_timeout_ms.or(cfg.flush_timeout_ms) {
            producer.flush_timeout_ms = ms;
        }
        producer.produce_timeout_ms = cfg.produce_timeout_ms;

        Ok(Self {
            producer,
            topic,
            count: args.count.or(cfg.count).unwrap_or(100),
            prefix: args.prefix.clone().or(cfg.prefix).unwrap_or_else(|| "Hello world".into()),
            transport,
            retry: cfg.retry,
        })
    }
}
