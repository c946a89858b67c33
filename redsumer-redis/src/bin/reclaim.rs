use anyhow::Result;
use clap::Parser;
use redsumer_redis::{
    ConsumerGroup, ConsumerId, DeadLetterPolicy, RedisConsumerOptions, RedisStreamer, StreamKey,
    StreamUrl,
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
    #[clap(long, help = "Dead-letter stream; defaults to `dead:letters:<stream>`")]
    dead_stream: Option<StreamKey>,
    #[clap(
        long,
        help = "Entries pending for this many seconds are dead",
        default_value = "3600"
    )]
    threshold: u64,
    #[clap(long, help = "Give entries with many deliveries more time")]
    retries: bool,
    #[clap(
        long,
        help = "Seconds between runs; run once if zero",
        default_value = "60"
    )]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        stream,
        group,
        consumer,
        dead_stream,
        threshold,
        retries,
        interval,
    } = Args::parse();

    let mut options = RedisConsumerOptions::new(ConsumerGroup::new(group));
    if let Some(consumer) = consumer {
        options.set_consumer_id(ConsumerId::new(consumer));
    }
    if let Some(dead_stream) = dead_stream {
        options.set_dead_letter_stream(dead_stream);
    }
    options.set_dead_letter_threshold(Duration::from_secs(threshold));
    if retries {
        options.set_dead_letter_policy(DeadLetterPolicy::IdleAndRetries);
    }

    let streamer = RedisStreamer::connect(stream.streamer(), Default::default()).await?;
    let mut consumer = streamer
        .create_consumer(stream.stream_key()?, options)
        .await?;
    let dead_stream = consumer.dead_letter_stream()?;

    loop {
        let moved = consumer.reclaim_dead_letters().await?;
        println!("Moved {moved} entries to {dead_stream}");
        if interval == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_secs(interval)).await;
    }

    Ok(())
}
