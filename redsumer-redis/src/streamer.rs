use std::{sync::Arc, time::Duration};

use crate::{
    ConnectionRegistry, GroupConsumer, NodeId, RedisConsumerOptions, RedisErr, RedisProducer,
    RedisResult, RedisStore, DEFAULT_TIMEOUT,
};
use redsumer_types::{ConnectOptions, StreamErr, StreamKey, StreamerUri};

#[derive(Debug, Clone)]
/// Entry point: connects to Redis and creates consumers and producers,
/// all sharing the same [`ConnectionRegistry`].
pub struct RedisStreamer {
    uri: StreamerUri,
    registry: Arc<ConnectionRegistry>,
}

#[derive(Debug, Default, Clone)]
pub struct RedisConnectOptions {
    db: u32,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
    disable_hostname_verification: bool,
}

impl RedisStreamer {
    /// Validates the uri and checks that the first node answers `PING`.
    pub async fn connect(uri: StreamerUri, options: RedisConnectOptions) -> RedisResult<Self> {
        let registry = Arc::new(ConnectionRegistry::new(options));
        Self::connect_with(uri, registry).await
    }

    /// Like [`RedisStreamer::connect`], but with an existing registry.
    pub async fn connect_with(
        uri: StreamerUri,
        registry: Arc<ConnectionRegistry>,
    ) -> RedisResult<Self> {
        match uri.protocol() {
            Some("redis") | Some("rediss") => (),
            Some(protocol) => {
                return Err(StreamErr::Connect(format!("unknown protocol `{protocol}`")))
            }
            None => return Err(StreamErr::Connect("protocol not set".to_owned())),
        }
        let streamer = Self { uri, registry };
        streamer.registry.ping(streamer.node()?).await?;
        Ok(streamer)
    }

    pub fn uri(&self) -> &StreamerUri {
        &self.uri
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Open a store on a new connection to the first node.
    pub async fn create_store(&self) -> RedisResult<RedisStore> {
        let conn = self.registry.connect_or_reconnect(self.node()?).await?;
        let timeout = self
            .registry
            .options()
            .timeout()
            .unwrap_or(DEFAULT_TIMEOUT);
        Ok(RedisStore::new(conn, timeout))
    }

    /// Create a consumer of `stream`, and make sure its group exists.
    ///
    /// This waits for the stream to come into existence according to the retry schedule
    /// of the options.
    pub async fn create_consumer(
        &self,
        stream: StreamKey,
        options: RedisConsumerOptions,
    ) -> RedisResult<GroupConsumer> {
        let store = self.create_store().await?;
        let mut consumer = GroupConsumer::new(store, stream, options);
        consumer.ensure_group().await?;
        Ok(consumer)
    }

    /// Create a producer anchored to `stream`.
    pub async fn create_producer(&self, stream: StreamKey) -> RedisResult<RedisProducer> {
        let mut producer = self.create_generic_producer().await?;
        producer.anchor(stream)?;
        Ok(producer)
    }

    pub async fn create_generic_producer(&self) -> RedisResult<RedisProducer> {
        Ok(RedisProducer::new(self.create_store().await?))
    }

    /// Check that every node answers `PING`.
    pub async fn ping(&self) -> RedisResult<()> {
        for node in self.uri.nodes() {
            self.registry.ping(node).await?;
        }
        Ok(())
    }

    fn node(&self) -> RedisResult<&NodeId> {
        self.uri
            .nodes()
            .first()
            .ok_or_else(|| StreamErr::Connect("There are no nodes".to_owned()))
    }
}

impl ConnectOptions for RedisConnectOptions {
    type Error = RedisErr;

    fn timeout(&self) -> RedisResult<Duration> {
        self.timeout.ok_or(StreamErr::TimeoutNotSet)
    }

    /// Timeout for network requests. If unset, defaults to [`DEFAULT_TIMEOUT`].
    fn set_timeout(&mut self, v: Duration) -> RedisResult<&mut Self> {
        self.timeout = Some(v);
        Ok(self)
    }
}

impl RedisConnectOptions {
    /// Defaults to 0.
    pub fn db(&self) -> u32 {
        self.db
    }
    pub fn set_db(&mut self, db: u32) -> &mut Self {
        self.db = db;
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
    pub fn set_username(&mut self, username: Option<String>) -> &mut Self {
        self.username = username;
        self
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
    pub fn set_password(&mut self, password: Option<String>) -> &mut Self {
        self.password = password;
        self
    }

    pub fn disable_hostname_verification(&self) -> bool {
        self.disable_hostname_verification
    }
    /// # Warning
    ///
    /// Only relevant if TLS is enabled and connecting to `rediss://`.
    /// Trust self-signed certificates. This is insecure. Do not use in production.
    pub fn set_disable_hostname_verification(&mut self, bool: bool) -> &mut Self {
        self.disable_hostname_verification = bool;
        self
    }
}
