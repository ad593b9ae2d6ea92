pub mod address;
pub mod error;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::oneshot;

pub use address::BrokerAddress;
pub use error::{ConnectionError, ProducerError, TransportError, TransportErrorKind};

// ════════════════════════════════════════════════════════════════
//  Message
// ════════════════════════════════════════════════════════════════

/// Выбор партиции для сообщения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Partition {
    /// Партицию выбирает транспорт.
    #[default]
    Any,
    /// Явно указанная партиция.
    Fixed(u32),
}

/// Сообщение для отправки в topic. Эфемерное значение: перемещается
/// в транспорт при submit и не хранится producer'ом.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
    pub key: Option<Vec<u8>>,
    pub partition: Partition,
}

impl Message {
    /// Сообщение без ключа, партиция — на усмотрение транспорта.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            key: None,
            partition: Partition::Any,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_partition(mut self, partition: u32) -> Self {
        self.partition = Partition::Fixed(partition);
        self
    }
}

// ════════════════════════════════════════════════════════════════
//  Delivery
// ════════════════════════════════════════════════════════════════

/// Подтверждение доставки: где сообщение оказалось на брокере.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
}

/// Событие, которое транспорт кладёт в слот уведомления.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryEvent {
    /// Сообщение доставлено.
    Delivered(DeliveryReport),
    /// Доставка не удалась.
    Failed(TransportError),
    /// Любое другое событие транспорта (статистика, лог и т.п.).
    /// Producer его не моделирует.
    Unrecognized { tag: String },
}

/// Receiving half of a delivery slot. Resolves to `Err` if the transport
/// dropped the notifier without reporting an outcome.
pub type DeliveryReceiver = oneshot::Receiver<DeliveryEvent>;

/// Одноразовый слот для результата доставки.
///
/// `notify` потребляет notifier, поэтому второе событие в тот же слот
/// положить нельзя.
#[derive(Debug)]
pub struct DeliveryNotifier {
    tx: oneshot::Sender<DeliveryEvent>,
}

impl DeliveryNotifier {
    /// Создать пару notifier / receiver для одного сообщения.
    pub fn channel() -> (DeliveryNotifier, DeliveryReceiver) {
        let (tx, rx) = oneshot::channel();
        (DeliveryNotifier { tx }, rx)
    }

    /// Сообщить результат. `false` — получатель уже ушёл (produce отменён).
    pub fn notify(self, event: DeliveryEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Итог `flush_and_close`: сколько доставок завершилось и сколько брошено.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushSummary {
    pub delivered: usize,
    pub abandoned: usize,
}

// ════════════════════════════════════════════════════════════════
//  Transport Traits
// ════════════════════════════════════════════════════════════════

/// Фабрика транспортных сессий (OpenSession).
pub trait Connector: Send + Sync {
    /// Открыть сессию к брокерам. Подключение может быть ленивым.
    fn open_session(
        &self,
        addresses: &[BrokerAddress],
    ) -> Result<Box<dyn TransportSession>, ConnectionError>;
}

/// Открытая транспортная сессия. Принадлежит ровно одному producer'у.
///
/// Контракт: на каждый успешно принятый `submit` транспорт кладёт в
/// `notify` ровно одно событие, асинхронно, возможно из другой задачи.
pub trait TransportSession: Send + Sync {
    /// Принять сообщение к доставке. Ошибка — отказ на этапе submit,
    /// событие в `notify` в этом случае не приходит.
    fn submit(&self, message: Message, notify: DeliveryNotifier) -> Result<(), TransportError>;

    /// Дождаться in-flight доставок не дольше `timeout` и закрыть сессию.
    /// Недоставленное по истечении таймаута бросается.
    fn flush_and_close(&self, timeout: Duration) -> Pin<Box<dyn Future<Output = FlushSummary> + Send + '_>>;
}
