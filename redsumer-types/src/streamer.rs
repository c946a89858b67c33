use std::{fmt::Display, str::FromStr};

use crate::{StreamKey, StreamUrlErr};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// URI of Streaming Server. If this is a cluster, there can be multiple nodes.
pub struct StreamerUri {
    nodes: Vec<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Streamer URI with stream key(s).
///
/// Examples:
///
/// ```ignore
/// redis://localhost/
/// redis://localhost:6379/orders
/// rediss://node-a:6379,node-b:6379/stream_a,stream_b
/// ```
pub struct StreamUrl {
    streamer: StreamerUri,
    streams: Vec<StreamKey>,
}

impl Display for StreamerUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", node)?;
        }
        write!(f, ")")
    }
}

impl StreamerUri {
    pub fn protocol(&self) -> Option<&str> {
        match self.nodes.first() {
            Some(node) if node.host().is_some() => Some(node.scheme()),
            _ => None,
        }
    }

    pub fn nodes(&self) -> &[Url] {
        &self.nodes
    }
}

impl StreamUrl {
    pub fn streamer(&self) -> StreamerUri {
        self.streamer.to_owned()
    }

    pub fn streamer_ref(&self) -> &StreamerUri {
        &self.streamer
    }

    pub fn stream_keys(&self) -> &[StreamKey] {
        &self.streams
    }

    pub fn stream_key(&self) -> Result<StreamKey, StreamUrlErr> {
        if self.streams.len() == 1 {
            Ok(self.streams[0].to_owned())
        } else {
            Err(StreamUrlErr::NotOneStreamKey)
        }
    }
}

impl FromStr for StreamUrl {
    type Err = StreamUrlErr;

    /// `<protocol>://<node>[,<node>..][/<stream>[,<stream>..]]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol, rest) = s.split_once("://").ok_or(StreamUrlErr::ProtocolRequired)?;
        if protocol.is_empty() {
            return Err(StreamUrlErr::ProtocolRequired);
        }
        let (nodes, streams) = match rest.split_once('/') {
            Some((nodes, streams)) => (nodes, streams),
            None => (rest, ""),
        };
        let nodes = nodes
            .split(',')
            .filter(|x| !x.is_empty())
            .map(|node| format!("{protocol}://{node}").parse::<Url>())
            .collect::<Result<Vec<_>, _>>()?;
        if nodes.is_empty() {
            return Err(StreamUrlErr::ZeroNode);
        }
        let streams = streams
            .split(',')
            .filter(|x| !x.is_empty())
            .map(StreamKey::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StreamUrl {
            streamer: StreamerUri { nodes },
            streams,
        })
    }
}

impl FromStr for StreamerUri {
    type Err = StreamUrlErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StreamUrl::from_str(s)?.streamer)
    }
}
