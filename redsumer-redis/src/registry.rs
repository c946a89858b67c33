use std::{collections::HashMap, sync::Arc};

use crate::{
    map_err, Connection, RedisConnectOptions, RedisErr, RedisResult, DEFAULT_TIMEOUT, REDIS_PORT,
};
use redis::{cmd as command, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use redsumer_runtime::AsyncRwLock;
use redsumer_types::{export::url::Url, ConnectOptions, StreamErr};

/// Address of a Redis node, e.g. `redis://localhost:6379`.
pub type NodeId = Url;

#[derive(Debug)]
/// Hands out connections to Redis nodes, reusing one client handle per node.
///
/// It is meant to be shared (behind an [`Arc`]) by every component of a process that talks
/// to Redis. Lookups take a shared lock; the first use of a node takes an exclusive lock,
/// so concurrent first uses of the same node still create a single client.
pub struct ConnectionRegistry {
    options: Arc<RedisConnectOptions>,
    clients: AsyncRwLock<HashMap<NodeId, redis::Client>>,
}

impl ConnectionRegistry {
    pub fn new(options: RedisConnectOptions) -> Self {
        Self {
            options: Arc::new(options),
            clients: AsyncRwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &RedisConnectOptions {
        &self.options
    }

    /// Get the client handle of a node, creating it on first use.
    pub async fn client(&self, node: &NodeId) -> RedisResult<redis::Client> {
        if let Some(client) = self.clients.read().await.get(node) {
            return Ok(client.clone());
        }
        let mut clients = self.clients.write().await;
        // someone may have registered it while we were waiting for the lock
        if let Some(client) = clients.get(node) {
            return Ok(client.clone());
        }
        let client = open_client(node, &self.options)?;
        log::debug!("Registered client for {node}");
        clients.insert(node.clone(), client.clone());
        Ok(client)
    }

    /// Open a new connection to a node.
    pub async fn connect(&self, node: &NodeId) -> RedisResult<Connection> {
        let client = self.client(node).await?;
        Connection::create(node.clone(), client, self.timeout()).await
    }

    /// Like [`ConnectionRegistry::connect`], but returns a connection that will retry
    /// in the background of the next request if the node is unreachable right now.
    pub async fn connect_or_reconnect(&self, node: &NodeId) -> RedisResult<Connection> {
        let client = self.client(node).await?;
        Ok(Connection::create_or_reconnect(node.clone(), client, self.timeout()).await)
    }

    /// Check that a node is reachable: `PING` must be answered by `PONG`.
    pub async fn ping(&self, node: &NodeId) -> RedisResult<()> {
        let mut conn = self.connect(node).await?;
        let reply = conn.request(&command("PING")).await?;
        let reply: String = redis::from_redis_value(&reply).map_err(map_err)?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(StreamErr::Backend(RedisErr::ResponseError(format!(
                "Expected PONG from {node}, got {reply}"
            ))))
        }
    }

    /// Number of nodes registered so far.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn timeout(&self) -> std::time::Duration {
        self.options.timeout().unwrap_or(DEFAULT_TIMEOUT)
    }
}

fn open_client(url: &NodeId, options: &RedisConnectOptions) -> RedisResult<redis::Client> {
    let host = if let Some(host) = url.host_str() {
        host.to_owned()
    } else {
        return Err(StreamErr::Connect("Host empty".to_owned()));
    };
    let port = url.port().unwrap_or(REDIS_PORT);
    let info = ConnectionInfo {
        addr: match url.scheme() {
            "redis" => ConnectionAddr::Tcp(host, port),
            "rediss" => ConnectionAddr::TcpTls {
                host,
                port,
                insecure: options.disable_hostname_verification(),
            },
            "" => return Err(StreamErr::Connect("protocol not set".to_owned())),
            protocol => return Err(StreamErr::Connect(format!("unknown protocol `{protocol}`"))),
        },
        redis: RedisConnectionInfo {
            db: options.db() as i64,
            username: options.username().map(|s| s.to_owned()),
            password: options.password().map(|s| s.to_owned()),
        },
    };
    redis::Client::open(info).map_err(map_err)
}
