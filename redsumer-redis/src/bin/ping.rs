use anyhow::Result;
use clap::Parser;
use redsumer_redis::{RedisStreamer, StreamerUri};
use std::time::Instant;

#[derive(Debug, Parser)]
struct Args {
    #[clap(
        long,
        help = "Streamer URI, i.e. try `redis://localhost`",
        env = "STREAMER_URI"
    )]
    streamer: StreamerUri,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args { streamer } = Args::parse();

    let start = Instant::now();
    let streamer = RedisStreamer::connect(streamer, Default::default()).await?;
    streamer.ping().await?;
    println!("PONG from {} in {:?}", streamer.uri(), start.elapsed());

    Ok(())
}
