use anyhow::Result;
use clap::Parser;
use redsumer_redis::{
    AutoClaimTier, ConsumerGroup, ConsumerId, PendingTier, RedisConsumerOptions, RedisStreamer,
    StreamUrl, TIMESTAMP_FORMAT,
};
use std::time::Duration;

#[derive(Debug, Parser)]
struct Args {
    #[clap(
        long,
        help = "Streamer URI with stream key, i.e. try `redis://localhost/hello`",
        env = "STREAM_URL"
    )]
    stream: StreamUrl,
    #[clap(long, help = "Consumer group", env = "GROUP")]
    group: String,
    #[clap(long, help = "Consumer id; defaults to host id + pid", env = "CONSUMER")]
    consumer: Option<String>,
    #[clap(long, help = "Also re-deliver own pending entries, this many at a time")]
    pending: Option<usize>,
    #[clap(long, help = "Also claim abandoned entries, this many at a time")]
    auto_claim: Option<usize>,
    #[clap(
        long,
        help = "Entries idle for this many seconds are deemed abandoned",
        default_value = "60"
    )]
    min_idle: u64,
    #[clap(long, help = "Do not acknowledge entries")]
    no_ack: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        stream,
        group,
        consumer,
        pending,
        auto_claim,
        min_idle,
        no_ack,
    } = Args::parse();

    let mut options = RedisConsumerOptions::new(ConsumerGroup::new(group));
    if let Some(consumer) = consumer {
        options.set_consumer_id(ConsumerId::new(consumer));
    }
    if let Some(batch_size) = pending {
        options.set_pending(PendingTier::Enabled { batch_size });
    }
    if let Some(batch_size) = auto_claim {
        options.set_auto_claim(AutoClaimTier::Enabled {
            batch_size,
            min_idle: Duration::from_secs(min_idle),
        });
    }

    let streamer = RedisStreamer::connect(stream.streamer(), Default::default()).await?;
    let mut consumer = streamer
        .create_consumer(stream.stream_key()?, options)
        .await?;
    log::info!("Consuming as {}", consumer.handle());

    loop {
        let entries = consumer.consume().await?;
        for entry in entries.iter() {
            println!(
                "[{timestamp} | {stream_key} | {id}] {fields:?}",
                timestamp = entry.timestamp().format(TIMESTAMP_FORMAT)?,
                stream_key = consumer.stream(),
                id = entry.id(),
                fields = entry.fields(),
            );
        }
        if !no_ack && !entries.is_empty() {
            let ids: Vec<_> = entries.iter().map(|e| *e.id()).collect();
            consumer.ack(&ids).await?;
        }
    }
}
