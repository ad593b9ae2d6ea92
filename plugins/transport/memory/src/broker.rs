use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use producer_api::{DeliveryReport, Message, Partition, TransportError};

use crate::MemoryTransportConfig;

// ═══════════════════════════════════════════════════════════════
//  Stored records
// ═══════════════════════════════════════════════════════════════

/// Запись, принятая брокером.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub partition: u32,
    pub offset: u64,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// Ring-buffer одной партиции. Offset'ы монотонны и не переиспользуются
/// после вытеснения старых записей.
struct PartitionLog {
    records: VecDeque<StoredRecord>,
    next_offset: u64,
}

impl PartitionLog {
    fn new() -> Self {
        Self {
            records: VecDeque::new(),
            next_offset: 0,
        }
    }
}

struct TopicLog {
    partitions: Vec<PartitionLog>,
    next_round_robin: u32,
}

impl TopicLog {
    fn new(partitions: u32) -> Self {
        Self {
            partitions: (0..partitions).map(|_| PartitionLog::new()).collect(),
            next_round_robin: 0,
        }
    }

    fn select_partition(&mut self, message: &Message) -> Result<u32, TransportError> {
        let count = self.partitions.len() as u32;
        match (message.partition, &message.key) {
            (Partition::Fixed(p), _) if p < count => Ok(p),
            (Partition::Fixed(p), _) => Err(TransportError::rejected(format!(
                "partition {p} out of range for topic '{}' ({count} partitions)",
                message.topic
            ))),
            (Partition::Any, Some(key)) => Ok(key_hash(key) % count),
            (Partition::Any, None) => {
                let p = self.next_round_robin % count;
                self.next_round_robin = self.next_round_robin.wrapping_add(1);
                Ok(p)
            }
        }
    }
}

/// FNV-1a: стабильный между запусками, в отличие от `DefaultHasher`.
fn key_hash(key: &[u8]) -> u32 {
    key.iter()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ *b as u32).wrapping_mul(0x0100_0193))
}

// ═══════════════════════════════════════════════════════════════
//  MemoryBroker
// ═══════════════════════════════════════════════════════════════

/// In-process брокер: topic → партиции → ring-buffer записей.
/// Разделяется между всеми сессиями одного `MemoryConnector`.
pub struct MemoryBroker {
    topics: RwLock<HashMap<String, TopicLog>>,
    partitions: u32,
    auto_create_topics: bool,
    max_records: usize,
}

impl MemoryBroker {
    pub fn new(config: &MemoryTransportConfig) -> Self {
        let partitions = config.partitions.max(1);
        let topics = config
            .topics
            .iter()
            .map(|name| (name.clone(), TopicLog::new(partitions)))
            .collect();
        Self {
            topics: RwLock::new(topics),
            partitions,
            auto_create_topics: config.auto_create_topics,
            max_records: config.max_records.max(1),
        }
    }

    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    /// Записать сообщение в лог партиции.
    pub async fn append(&self, message: Message) -> Result<DeliveryReport, TransportError> {
        let mut topics = self.topics.write().await;
        if !topics.contains_key(&message.topic) {
            if !self.auto_create_topics {
                return Err(TransportError::unknown_topic(&message.topic));
            }
            tracing::debug!(topic = %message.topic, partitions = self.partitions, "auto-created topic");
            topics.insert(message.topic.clone(), TopicLog::new(self.partitions));
        }
        let Some(topic) = topics.get_mut(&message.topic) else {
            return Err(TransportError::unknown_topic(&message.topic));
        };

        let partition = topic.select_partition(&message)?;
        let log = &mut topic.partitions[partition as usize];
        let offset = log.next_offset;
        log.next_offset += 1;
        if log.records.len() >= self.max_records {
            log.records.pop_front();
        }
        log.records.push_back(StoredRecord {
            partition,
            offset,
            key: message.key,
            payload: message.payload,
        });

        Ok(DeliveryReport {
            topic: message.topic,
            partition,
            offset,
        })
    }

    /// Все хранимые записи topic'а: по партициям, внутри — по offset.
    pub async fn records(&self, topic: &str) -> Vec<StoredRecord> {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .map(|t| {
                t.partitions
                    .iter()
                    .flat_map(|p| p.records.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
