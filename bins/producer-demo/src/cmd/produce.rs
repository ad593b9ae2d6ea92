use producer_core::{Producer, RetryProducer};
use transport_memory::MemoryConnector;

use super::config::Effective;
use super::error::DemoError;

// ═══════════════════════════════════════════════════════════════
//  Main dispatch
// ═══════════════════════════════════════════════════════════════

/// Открыть producer, отправить `count` сообщений, закрыть.
/// Первая ошибка прерывает отправку; close вызывается в любом случае.
pub async fn run(args: &Effective) -> Result<usize, DemoError> {
    let connector = MemoryConnector::new(args.transport.clone());
    let broker = connector.broker();

    let mut producer = Producer::with_config(&connector, &args.producer)?;
    tracing::info!(
        brokers = %args.producer.addresses.join(","),
        topic = %args.topic,
        count = args.count,
        "producer opened"
    );

    let start = std::time::Instant::now();
    let result = send_all(&producer, args).await;
    producer.close().await;
    let sent = result?;

    let elapsed = start.elapsed();
    let stored = broker.records(&args.topic).await.len();
    tracing::info!(
        sent,
        stored,
        elapsed_s = format_args!("{:.3}", elapsed.as_secs_f64()),
        rate = format_args!("{:.1}", sent as f64 / elapsed.as_secs_f64().max(f64::EPSILON)),
        "send complete"
    );
    Ok(sent)
}

async fn send_all(producer: &Producer, args: &Effective) -> Result<usize, DemoError> {
    let retry = args.retry.clone().map(|policy| RetryProducer::new(producer, policy));

    for i in 0..args.count {
        let msg = format!("{} {i}", args.prefix);
        let res = match &retry {
            Some(r) => r.produce(msg, &args.topic).await,
            None => producer.produce(msg, &args.topic).await,
        };
        if let Err(source) = res {
            tracing::error!(index = i, fatal = source.is_fatal(), error = %source, "produce failed, aborting run");
            return Err(DemoError::Produce { index: i, source });
        }

        if (i + 1) % 100 == 0 {
            tracing::debug!(sent = i + 1, total = args.count, "progress");
        }
    }
    Ok(args.count)
}
