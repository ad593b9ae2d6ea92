use std::time::Duration;

use producer_api::{
    BrokerAddress, ConnectionError, Connector, DeliveryEvent, DeliveryNotifier,
    DeliveryReport, Message, ProducerError, TransportError, TransportSession,
};

use crate::config::ProducerConfig;

// ═══════════════════════════════════════════════════════════════
//  Producer
// ═══════════════════════════════════════════════════════════════

/// Синхронный (с точки зрения вызывающего) producer: каждый `produce`
/// возвращается только после того, как транспорт сообщил результат
/// доставки именно этого сообщения.
///
/// Владеет транспортной сессией эксклюзивно. `produce` берёт `&self` и
/// может вызываться конкурентно: у каждого вызова свой слот уведомления.
/// `close` берёт `&mut self`, поэтому не может пересечься с `produce`.
pub struct Producer {
    session: Option<Box<dyn TransportSession>>,
    addresses: Vec<BrokerAddress>,
    flush_timeout: Duration,
    produce_timeout: Option<Duration>,
}

impl Producer {
    /// Открыть producer с настройками по умолчанию (flush 5000 мс, без таймаута produce).
    pub fn open<S: AsRef<str>>(connector: &dyn Connector, addresses: &[S]) -> Result<Self, ConnectionError> {
        Self::with_config(connector, &ProducerConfig::new(addresses))
    }

    /// Открыть producer. Пустой список адресов отклоняется до обращения
    /// к транспорту — сессия не создаётся.
    pub fn with_config(connector: &dyn Connector, config: &ProducerConfig) -> Result<Self, ConnectionError> {
        if config.addresses.is_empty() {
            return Err(ConnectionError::NoAddresses);
        }
        let addresses = BrokerAddress::parse_list(&config.addresses)?;
        let session = connector.open_session(&addresses)?;

        tracing::debug!(brokers = addresses.len(), first = %addresses[0], "producer opened");

        Ok(Self {
            session: Some(session),
            addresses,
            flush_timeout: config.flush_timeout(),
            produce_timeout: config.produce_timeout(),
        })
    }

    pub fn addresses(&self) -> &[BrokerAddress] {
        &self.addresses
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Отправить payload в topic (без ключа, любая партиция) и дождаться
    /// подтверждения. Повторов нет — политика повторов на вызывающем.
    pub async fn produce(&self, payload: impl Into<Vec<u8>>, topic: &str) -> Result<(), ProducerError> {
        self.produce_message(Message::new(topic, payload)).await.map(|_| ())
    }

    /// То же, что `produce`, но для готового `Message` (ключ, фиксированная
    /// партиция). Возвращает отчёт о доставке.
    pub async fn produce_message(&self, message: Message) -> Result<DeliveryReport, ProducerError> {
        let session = self.session.as_deref().ok_or(ProducerError::Closed)?;
        if message.topic.is_empty() {
            return Err(TransportError::rejected("topic must not be empty").into());
        }

        let (notify, rx) = DeliveryNotifier::channel();
        session.submit(message, notify)?;

        let received = match self.produce_timeout {
            Some(limit) => tokio::time::timeout(limit, rx).await.map_err(|_| {
                TransportError::timed_out(format!("no delivery outcome within {} ms", limit.as_millis()))
            })?,
            None => rx.await,
        };

        match received {
            Ok(DeliveryEvent::Delivered(report)) => {
                tracing::trace!(
                    topic = %report.topic,
                    partition = report.partition,
                    offset = report.offset,
                    "delivered"
                );
                Ok(report)
            }
            Ok(DeliveryEvent::Failed(e)) => Err(e.into()),
            Ok(DeliveryEvent::Unrecognized { tag }) => {
                Err(ProducerError::UnknownOutcome(format!("unrecognized transport event '{tag}'")))
            }
            Err(_) => Err(ProducerError::UnknownOutcome(
                "notification slot dropped without an outcome".into(),
            )),
        }
    }

    /// Дождаться in-flight доставок (не дольше flush timeout) и освободить
    /// сессию. Ошибок не возвращает. Повторный вызов — no-op.
    pub async fn close(&mut self) {
        let Some(session) = self.session.take() else {
            tracing::debug!("producer already closed");
            return;
        };

        let summary = session.flush_and_close(self.flush_timeout).await;
        if summary.abandoned > 0 {
            tracing::warn!(
                abandoned = summary.abandoned,
                delivered = summary.delivered,
                flush_timeout_ms = self.flush_timeout.as_millis() as u64,
                "flush timed out, pending deliveries abandoned"
            );
        }
        tracing::debug!(delivered = summary.delivered, "producer closed");
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::warn!("producer dropped without close, in-flight deliveries are not flushed");
        }
    }
}
