use producer_core::{ConnectionError, ProducerError};

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Connection(#[from] ConnectionError),

    #[error("message #{index}: {source}")]
    Produce { index: usize, source: ProducerError },
}
