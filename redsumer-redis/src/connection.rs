use std::{fmt::Debug, time::Duration};

use crate::{is_disconnect, map_err, NodeId, RedisErr, RedisResult};
use redis::{aio::ConnectionLike, Cmd, Value};
use redsumer_runtime::{sleep, timeout};
use redsumer_types::StreamErr;

/// Give up reconnecting once the backoff exceeds this many seconds.
const MAX_RECONNECT_DELAY: u32 = 60;

#[derive(Debug)]
/// A wrapped [`redis::aio::Connection`] that can auto-reconnect.
///
/// The underlying connection is not safe to reuse if a request future is dropped before its
/// reply is read, because the reply would then be mistaken for the reply of the next request.
/// [`Connection::request`] keeps track of that, and transparently reconnects in such case.
pub struct Connection {
    node: NodeId,
    client: redis::Client,
    timeout: Duration,
    state: State,
    in_flight: bool,
}

enum State {
    Alive(redis::aio::Connection),
    /// Wait `delay` seconds, then reconnect. Zero means reconnect immediately.
    Reconnecting { delay: u32 },
    Dead,
}

impl Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alive(_) => f.debug_tuple("Alive").finish(),
            Self::Reconnecting { delay } => f.debug_tuple("Reconnecting").field(delay).finish(),
            Self::Dead => f.debug_tuple("Dead").finish(),
        }
    }
}

impl Connection {
    /// Create a connection; return error if failed.
    pub async fn create(
        node: NodeId,
        client: redis::Client,
        timeout: Duration,
    ) -> RedisResult<Self> {
        let conn = create_connection(&client, timeout).await?;
        log::debug!("Opened connection to {node}");
        Ok(Self {
            node,
            client,
            timeout,
            state: State::Alive(conn),
            in_flight: false,
        })
    }

    /// Create a connection; but retry later if failed.
    pub async fn create_or_reconnect(
        node: NodeId,
        client: redis::Client,
        timeout: Duration,
    ) -> Self {
        let state = match create_connection(&client, timeout).await {
            Ok(conn) => State::Alive(conn),
            Err(err) => {
                log::warn!("Failed to connect to {node}: {err}; will retry");
                State::Reconnecting { delay: 1 }
            }
        };
        Self {
            node,
            client,
            timeout,
            state,
            in_flight: false,
        }
    }

    /// Drop the connection and reconnect *later*.
    pub fn reconnect(&mut self) {
        self.state = State::Reconnecting { delay: 1 };
    }

    /// Get a mutable connection, will wait and retry a few times until dead.
    pub async fn get(&mut self) -> RedisResult<&mut redis::aio::Connection> {
        if self.in_flight {
            log::warn!("A request to {} was interrupted, reconnecting", self.node);
            self.in_flight = false;
            self.state = State::Reconnecting { delay: 0 };
        }
        if let State::Reconnecting { delay } = self.state {
            if delay > 0 {
                sleep(Duration::from_secs(delay as u64)).await;
            }
            match create_connection(&self.client, self.timeout).await {
                Ok(conn) => {
                    log::debug!("Reconnected to {}", self.node);
                    self.state = State::Alive(conn);
                }
                Err(err) => {
                    log::warn!("Failed to reconnect to {}: {err}", self.node);
                    if delay > MAX_RECONNECT_DELAY {
                        self.state = State::Dead;
                    } else {
                        self.state = State::Reconnecting {
                            delay: (delay * 2).max(1),
                        };
                    }
                }
            }
        }
        self.try_get()
    }

    /// Get a mutable connection, only if it is alive.
    pub fn try_get(&mut self) -> RedisResult<&mut redis::aio::Connection> {
        match &mut self.state {
            State::Alive(conn) => Ok(conn),
            State::Dead => Err(StreamErr::Connect(format!(
                "Connection to {} is dead.",
                self.node
            ))),
            State::Reconnecting { .. } => Err(StreamErr::Backend(RedisErr::TryAgain(format!(
                "Reconnecting to {}",
                self.node
            )))),
        }
    }

    /// Send a command and read its reply.
    ///
    /// An IO error drops the connection, to be re-established on the next request.
    pub async fn request(&mut self, cmd: &Cmd) -> RedisResult<Value> {
        self.get().await?;
        let Self {
            node,
            state,
            in_flight,
            ..
        } = self;
        let conn = match state {
            State::Alive(conn) => conn,
            _ => {
                return Err(StreamErr::Connect(format!(
                    "Connection to {node} is not alive."
                )))
            }
        };
        *in_flight = true;
        let result = conn.req_packed_command(cmd).await;
        *in_flight = false;
        result.map_err(|err| {
            let err = map_err(err);
            if is_disconnect(&err) {
                log::warn!("Lost connection to {node}: {err}");
                *state = State::Reconnecting { delay: 1 };
            }
            err
        })
    }

    pub fn protocol(&self) -> &str {
        self.node.scheme()
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node
    }
}

async fn create_connection(
    client: &redis::Client,
    dur: Duration,
) -> RedisResult<redis::aio::Connection> {
    match timeout(dur, client.get_async_connection()).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(err)) => Err(map_err(err)),
        Err(_) => Err(StreamErr::Connect("Connection timeout".to_owned())),
    }
}
