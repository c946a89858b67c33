use crate::{RedisErr, RedisResult, RedisStore};
use redsumer_types::{EntryId, StreamErr, StreamKey, StreamStore};

#[derive(Debug)]
/// Appends entries to streams with `XADD`.
///
/// A producer can be anchored to a stream, so that [`RedisProducer::send`] can be used
/// without specifying the stream every time.
pub struct RedisProducer {
    store: RedisStore,
    stream: Option<StreamKey>,
}

impl RedisProducer {
    pub fn new(store: RedisStore) -> Self {
        Self {
            store,
            stream: None,
        }
    }

    /// Anchor this producer to a stream.
    pub fn anchor(&mut self, stream: StreamKey) -> RedisResult<()> {
        if self.stream.is_none() {
            self.stream = Some(stream);
            Ok(())
        } else {
            Err(StreamErr::Backend(RedisErr::ClientError(
                "Producer is already anchored".to_owned(),
            )))
        }
    }

    pub fn anchored(&self) -> Option<&StreamKey> {
        self.stream.as_ref()
    }

    /// Append to the anchored stream.
    pub async fn send(&mut self, fields: &[(String, String)]) -> RedisResult<EntryId> {
        let stream = self.stream.clone().ok_or_else(|| {
            StreamErr::Backend(RedisErr::ClientError("Producer is not anchored".to_owned()))
        })?;
        self.send_to(&stream, fields).await
    }

    /// Append to the given stream. Returns the id assigned by the server.
    pub async fn send_to(
        &mut self,
        stream: &StreamKey,
        fields: &[(String, String)],
    ) -> RedisResult<EntryId> {
        let id = self.store.append(stream, fields).await?;
        log::trace!("XADD {stream} {id}");
        Ok(id)
    }
}
