mod common;

use std::time::Duration;

use common::{BROKERS, FakeConnector, Reply, TOPIC};
use producer_core::{
    DeliveryEvent, Producer, ProducerConfig, ProducerError, RetryPolicy, RetryProducer,
    TransportError, TransportErrorKind,
};

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 10,
        max_backoff_ms: 100,
        multiplier: 2.0,
    }
}

#[tokio::test(start_paused = true)]
async fn retries_transient_failures() {
    let connector = FakeConnector::scripted(|n| {
        if n < 3 {
            Reply::Fail(TransportError::unreachable("broker restarting"))
        } else {
            Reply::Deliver
        }
    });
    let mut producer = Producer::open(&connector, &BROKERS).unwrap();

    RetryProducer::new(&producer, policy(3)).produce("m", TOPIC).await.unwrap();
    producer.close().await;

    assert_eq!(connector.state.submits(), 3);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let connector = FakeConnector::scripted(|_| Reply::Fail(TransportError::unreachable("down")));
    let mut producer = Producer::open(&connector, &BROKERS).unwrap();

    let err = RetryProducer::new(&producer, policy(4)).produce("m", TOPIC).await.unwrap_err();
    producer.close().await;

    assert_eq!(err.transport_kind(), Some(TransportErrorKind::Unreachable));
    assert_eq!(connector.state.submits(), 4);
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let connector = FakeConnector::scripted(|_| Reply::Fail(TransportError::unknown_topic(TOPIC)));
    let mut producer = Producer::open(&connector, &BROKERS).unwrap();

    let err = RetryProducer::new(&producer, policy(5)).produce("m", TOPIC).await.unwrap_err();
    producer.close().await;

    assert_eq!(err.transport_kind(), Some(TransportErrorKind::UnknownTopic));
    assert_eq!(connector.state.submits(), 1);
}

#[tokio::test]
async fn unknown_outcome_is_not_retried() {
    let connector = FakeConnector::scripted(|_| {
        Reply::Event(DeliveryEvent::Unrecognized { tag: "log".into() })
    });
    let mut producer = Producer::open(&connector, &BROKERS).unwrap();

    let err = RetryProducer::new(&producer, policy(5)).produce("m", TOPIC).await.unwrap_err();
    producer.close().await;

    assert!(matches!(err, ProducerError::UnknownOutcome(_)));
    assert_eq!(connector.state.submits(), 1);
}

#[tokio::test(start_paused = true)]
async fn timed_out_produce_is_not_resent() {
    let connector = FakeConnector::always_ok().with_delay(Duration::from_millis(150));
    let mut config = ProducerConfig::new(&BROKERS);
    config.produce_timeout_ms = Some(100);
    let mut producer = Producer::with_config(&connector, &config).unwrap();

    let err = RetryProducer::new(&producer, policy(5)).produce("once", TOPIC).await.unwrap_err();
    assert_eq!(err.transport_kind(), Some(TransportErrorKind::TimedOut));
    assert_eq!(connector.state.submits(), 1);

    producer.close().await;
    assert_eq!(connector.state.notifications(), 1);
}
