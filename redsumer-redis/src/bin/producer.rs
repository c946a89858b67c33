use anyhow::Result;
use clap::Parser;
use redsumer_redis::{RedisStreamer, StreamUrl};
use std::time::Duration;

#[derive(Debug, Parser)]
struct Args {
    #[clap(
        long,
        help = "Streamer URI with stream key, i.e. try `redis://localhost/hello`",
        env = "STREAM_URL"
    )]
    stream: StreamUrl,
    #[clap(long, help = "Number of entries to append", default_value = "10")]
    count: usize,
    #[clap(long, help = "Interval between entries in milliseconds", default_value = "0")]
    interval: u64,
    #[clap(long, help = "Name of the payload field", default_value = "msg")]
    field: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        stream,
        count,
        interval,
        field,
    } = Args::parse();

    let streamer = RedisStreamer::connect(stream.streamer(), Default::default()).await?;
    let mut producer = streamer.create_producer(stream.stream_key()?).await?;

    for i in 0..count {
        let id = producer.send(&[(field.clone(), format!("hi {i}"))]).await?;
        println!("{id}");
        if interval > 0 {
            tokio::time::sleep(Duration::from_millis(interval)).await;
        }
    }

    Ok(())
}
