//! Parsers turning raw replies into typed values.
//!
//! Like [`redis::FromRedisValue`], but taking ownership of the [`Value`] tree instead of
//! copying, since stream replies are nested five levels deep.

use std::time::Duration;

use redsumer_types::{
    AutoClaimReply, ConsumerId, EntryId, Fields, PendingRecord, StreamEntry, StreamErr,
};

pub use redis::Value;

use crate::{RedisErr, RedisResult};

fn err<T>(what: &str, value: &Value) -> RedisResult<T> {
    Err(StreamErr::Backend(RedisErr::Reply(format!(
        "{what}: {value:?}"
    ))))
}

pub fn string_from_redis_value(v: Value) -> RedisResult<String> {
    match v {
        Value::Data(bytes) => String::from_utf8(bytes)
            .map_err(|e| StreamErr::Backend(RedisErr::TypeError(e.to_string()))),
        Value::Okay => Ok("OK".to_owned()),
        Value::Status(val) => Ok(val),
        v => err("Value not String", &v),
    }
}

pub fn int_from_redis_value(v: Value) -> RedisResult<i64> {
    match v {
        Value::Int(i) => Ok(i),
        v => err("Value not Int", &v),
    }
}

pub fn entry_id_from_redis_value(v: Value) -> RedisResult<EntryId> {
    let id = string_from_redis_value(v)?;
    id.parse()
        .map_err(|_| StreamErr::Backend(RedisErr::EntryId(id)))
}

fn fields_from_redis_value(v: Value) -> RedisResult<Fields> {
    match v {
        // the entry has been deleted, but is still referenced by the pending list
        Value::Nil => Ok(Vec::new()),
        Value::Bulk(values) => {
            if values.len() % 2 != 0 {
                return err("Odd number of field-value items", &Value::Bulk(values));
            }
            let mut fields = Vec::with_capacity(values.len() / 2);
            let mut values = values.into_iter();
            while let (Some(field), Some(value)) = (values.next(), values.next()) {
                fields.push((
                    string_from_redis_value(field)?,
                    string_from_redis_value(value)?,
                ));
            }
            Ok(fields)
        }
        v => err("Fields not Bulk", &v),
    }
}

/// `[id, [field, value, ...]]`. Returns `None` for a `Nil` placeholder, which `XCLAIM`
/// and `XAUTOCLAIM` emit for entries deleted from the stream.
pub fn entry_from_redis_value(v: Value) -> RedisResult<Option<StreamEntry>> {
    match v {
        Value::Nil => Ok(None),
        Value::Bulk(values) => match <[Value; 2]>::try_from(values) {
            Ok([id, fields]) => Ok(Some(StreamEntry::new(
                entry_id_from_redis_value(id)?,
                fields_from_redis_value(fields)?,
            ))),
            Err(values) => err("Malformed entry", &Value::Bulk(values)),
        },
        v => err("Malformed entry", &v),
    }
}

/// A list of entries, skipping `Nil` placeholders.
pub fn entries_from_redis_value(v: Value) -> RedisResult<Vec<StreamEntry>> {
    match v {
        Value::Nil => Ok(Vec::new()),
        Value::Bulk(values) => {
            let mut entries = Vec::with_capacity(values.len());
            for value in values {
                if let Some(entry) = entry_from_redis_value(value)? {
                    entries.push(entry);
                }
            }
            Ok(entries)
        }
        v => err("Entries not Bulk", &v),
    }
}

/// Reply of `XREAD` / `XREADGROUP` over a single stream:
/// `[[stream_key, [entry, ...]]]`, or `Nil` if a blocking read timed out.
pub fn read_reply_from_redis_value(v: Value) -> RedisResult<Vec<StreamEntry>> {
    match v {
        Value::Nil => Ok(Vec::new()),
        Value::Bulk(streams) => {
            let mut entries = Vec::new();
            for stream in streams {
                match stream {
                    Value::Bulk(values) if values.len() == 2 => {
                        if let Some(value) = values.into_iter().nth(1) {
                            entries.extend(entries_from_redis_value(value)?);
                        }
                    }
                    v => return err("Malformed stream in read reply", &v),
                }
            }
            Ok(entries)
        }
        v => err("Read reply not Bulk", &v),
    }
}

/// Reply of the extended form of `XPENDING`:
/// `[[id, consumer, idle_millis, delivery_count], ...]`.
pub fn pending_from_redis_value(v: Value) -> RedisResult<Vec<PendingRecord>> {
    let values = match v {
        Value::Nil => return Ok(Vec::new()),
        Value::Bulk(values) => values,
        v => return err("Pending reply not Bulk", &v),
    };
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        let values = match value {
            Value::Bulk(values) => values,
            v => return err("Pending record not Bulk", &v),
        };
        match <[Value; 4]>::try_from(values) {
            Ok([id, owner, idle, count]) => {
                let idle = int_from_redis_value(idle)?;
                let count = int_from_redis_value(count)?;
                records.push(PendingRecord::new(
                    entry_id_from_redis_value(id)?,
                    ConsumerId::new(string_from_redis_value(owner)?),
                    Duration::from_millis(idle.max(0) as u64),
                    count.max(0) as u64,
                ));
            }
            Err(values) => return err("Malformed pending record", &Value::Bulk(values)),
        }
    }
    Ok(records)
}

/// Reply of `XAUTOCLAIM`: `[next_cursor, [entry, ...]]`, followed by a list of
/// deleted ids since Redis 7.
pub fn auto_claim_from_redis_value(v: Value) -> RedisResult<AutoClaimReply> {
    match v {
        Value::Bulk(values) => {
            let mut items = values.into_iter();
            match (items.next(), items.next()) {
                (Some(next), Some(entries)) => Ok(AutoClaimReply {
                    next: entry_id_from_redis_value(next)?,
                    entries: entries_from_redis_value(entries)?,
                }),
                (next, entries) => err(
                    "Malformed auto-claim reply",
                    &Value::Bulk(next.into_iter().chain(entries).collect()),
                ),
            }
        }
        v => err("Malformed auto-claim reply", &v),
    }
}
