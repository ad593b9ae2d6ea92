pub mod config;
mod producer;
pub mod retry;

pub use config::ProducerConfig;
pub use producer::Producer;
pub use retry::{RetryPolicy, RetryProducer};

pub use producer_api::{
    BrokerAddress, ConnectionError, Connector, DeliveryEvent, DeliveryNotifier, DeliveryReport,
    FlushSummary, Message, Partition, ProducerError, TransportError, TransportErrorKind,
    TransportSession,
};
