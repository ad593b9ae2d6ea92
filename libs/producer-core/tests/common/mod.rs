#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use producer_core::{
    BrokerAddress, ConnectionError, Connector, DeliveryEvent, DeliveryNotifier, DeliveryReport,
    FlushSummary, Message, TransportError, TransportSession,
};

/// What the fake transport does with the n-th submitted message (1-based).
pub enum Reply {
    Deliver,
    Fail(TransportError),
    Event(DeliveryEvent),
    /// Drop the notifier without reporting anything.
    DropSlot,
}

type Script = dyn Fn(usize) -> Reply + Send + Sync;

#[derive(Default)]
pub struct FakeState {
    pub sessions_opened: AtomicUsize,
    pub submits: AtomicUsize,
    pub notifications: AtomicUsize,
    pub flushes: AtomicUsize,
    pub messages: Mutex<Vec<Message>>,
    inflight: Mutex<Vec<JoinHandle<()>>>,
}

impl FakeState {
    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|m| String::from_utf8_lossy(&m.payload).into_owned())
            .collect()
    }
}

/// Scripted stand-in for a broker client. Every accepted submit produces
/// exactly one `Reply`, after `delay` (or inline when the delay is zero).
pub struct FakeConnector {
    pub state: Arc<FakeState>,
    script: Arc<Script>,
    delay: Arc<dyn Fn(usize) -> Duration + Send + Sync>,
    fail_submit_at: Option<usize>,
}

impl FakeConnector {
    pub fn always_ok() -> Self {
        Self::scripted(|_| Reply::Deliver)
    }

    pub fn scripted(script: impl Fn(usize) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(FakeState::default()),
            script: Arc::new(script),
            delay: Arc::new(|_| Duration::ZERO),
            fail_submit_at: None,
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.with_delay_fn(move |_| delay)
    }

    pub fn with_delay_fn(mut self, delay: impl Fn(usize) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Arc::new(delay);
        self
    }

    /// Reject the n-th submit (1-based) synchronously.
    pub fn failing_submit_at(mut self, n: usize) -> Self {
        self.fail_submit_at = Some(n);
        self
    }
}

impl Connector for FakeConnector {
    fn open_session(&self, addresses: &[BrokerAddress]) -> Result<Box<dyn TransportSession>, ConnectionError> {
        if addresses.is_empty() {
            return Err(ConnectionError::NoAddresses);
        }
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
            script: self.script.clone(),
            delay: self.delay.clone(),
            fail_submit_at: self.fail_submit_at,
        }))
    }
}

struct FakeSession {
    state: Arc<FakeState>,
    script: Arc<Script>,
    delay: Arc<dyn Fn(usize) -> Duration + Send + Sync>,
    fail_submit_at: Option<usize>,
}

fn reply(state: &FakeState, n: usize, topic: String, outcome: Reply, notify: DeliveryNotifier) {
    let event = match outcome {
        Reply::Deliver => DeliveryEvent::Delivered(DeliveryReport {
            topic,
            partition: 0,
            offset: (n - 1) as u64,
        }),
        Reply::Fail(e) => DeliveryEvent::Failed(e),
        Reply::Event(ev) => ev,
        Reply::DropSlot => {
            drop(notify);
            return;
        }
    };
    state.notifications.fetch_add(1, Ordering::SeqCst);
    notify.notify(event);
}

impl TransportSession for FakeSession {
    fn submit(&self, message: Message, notify: DeliveryNotifier) -> Result<(), TransportError> {
        let n = self.state.submits.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_submit_at == Some(n) {
            return Err(TransportError::unreachable(format!("submit #{n} refused")));
        }

        let topic = message.topic.clone();
        self.state.messages.lock().unwrap().push(message);

        let outcome = (self.script)(n);
        let delay = (self.delay)(n);
        if delay.is_zero() {
            reply(&self.state, n, topic, outcome, notify);
        } else {
            let state = self.state.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                reply(&state, n, topic, outcome, notify);
            });
            self.state.inflight.lock().unwrap().push(handle);
        }
        Ok(())
    }

    fn flush_and_close(&self, timeout: Duration) -> Pin<Box<dyn Future<Output = FlushSummary> + Send + '_>> {
        Box::pin(async move {
            self.state.flushes.fetch_add(1, Ordering::SeqCst);
            let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.state.inflight.lock().unwrap());
            let deadline = tokio::time::Instant::now() + timeout;
            let mut summary = FlushSummary::default();
            for mut handle in handles {
                match tokio::time::timeout_at(deadline, &mut handle).await {
                    Ok(_) => summary.delivered += 1,
                    Err(_) => {
                        handle.abort();
                        summary.abandoned += 1;
                    }
                }
            }
            summary
        })
    }
}

pub const BROKERS: [&str; 2] = ["localhost:9091", "localhost:9092"];
pub const TOPIC: &str = "my-awesome-topic";
