/// Category of a transport failure. Lets callers decide whether a message
/// is worth resubmitting (see [`TransportError::is_retryable`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Broker unreachable or connection lost — transient.
    Unreachable,
    /// Topic does not exist on the broker — permanent for this message.
    UnknownTopic,
    /// Message rejected (bad topic name, partition out of range, too large) — permanent.
    Rejected,
    /// No outcome within the allotted time — transient.
    TimedOut,
    /// Session already flushed and closed — permanent.
    Closed,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportErrorKind::Unreachable => f.write_str("unreachable"),
            TransportErrorKind::UnknownTopic => f.write_str("unknown topic"),
            TransportErrorKind::Rejected => f.write_str("rejected"),
            TransportErrorKind::TimedOut => f.write_str("timed out"),
            TransportErrorKind::Closed => f.write_str("closed"),
        }
    }
}

/// A specific message failed to be accepted or delivered.
///
/// Carries a [`TransportErrorKind`] for categorization and a human-readable
/// message. Constructors mirror the kinds so transports can write
/// `TransportError::unknown_topic(name)` instead of building the struct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unreachable, msg)
    }

    pub fn unknown_topic(topic: &str) -> Self {
        Self::new(TransportErrorKind::UnknownTopic, format!("topic '{topic}' does not exist"))
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Rejected, msg)
    }

    pub fn timed_out(msg: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::TimedOut, msg)
    }

    pub fn closed() -> Self {
        Self::new(TransportErrorKind::Closed, "transport session is closed")
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Only a refused connection is safe to resubmit. A timed-out message
    /// may still be in flight, so resending it could store a duplicate.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Unreachable)
    }
}

/// Transport session could not be established. Fatal to `open`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("no broker addresses configured")]
    NoAddresses,

    #[error("invalid broker address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by the producer core to its immediate caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProducerError {
    #[error("connection: {0}")]
    Connection(#[from] ConnectionError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The transport broke its contract: an event the core does not model,
    /// or a notification slot dropped without an outcome.
    #[error("unknown delivery outcome: {0}")]
    UnknownOutcome(String),

    #[error("producer is closed")]
    Closed,
}

impl ProducerError {
    /// Errors that must abort the calling flow rather than be handled per message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProducerError::UnknownOutcome(_) | ProducerError::Closed)
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ProducerError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            ProducerError::Transport(e) => Some(e.kind()),
            _ => None,
        }
    }
}
