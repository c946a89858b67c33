use std::fmt::Display;

use crate::StreamKey;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Used to identify a group of consumers.
pub struct ConsumerGroup {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Used to identify a consumer within a group.
pub struct ConsumerId {
    id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// One consumer's view of one group of one stream.
///
/// Every store operation on a consumer group is keyed by this triple.
/// Within a process, at most one engine should drive a given handle,
/// because the read cursors are kept client side.
pub struct ConsumerGroupHandle {
    stream: StreamKey,
    group: ConsumerGroup,
    consumer: ConsumerId,
}

impl ConsumerGroup {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ConsumerId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl ConsumerGroupHandle {
    pub fn new(stream: StreamKey, group: ConsumerGroup, consumer: ConsumerId) -> Self {
        Self {
            stream,
            group,
            consumer,
        }
    }

    pub fn stream(&self) -> &StreamKey {
        &self.stream
    }

    pub fn group(&self) -> &ConsumerGroup {
        &self.group
    }

    pub fn consumer(&self) -> &ConsumerId {
        &self.consumer
    }
}

impl Display for ConsumerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for ConsumerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Display for ConsumerGroupHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.stream, self.group, self.consumer)
    }
}
