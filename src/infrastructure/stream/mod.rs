//! Click event stream on Redis Streams.
//!
//! Each shard is one Redis stream. Events are appended with `XADD` under the
//! field [`PAYLOAD_FIELD`] and consumed through a consumer group, so a
//! restarted worker resumes from its last acknowledged entry.

mod redis_stream;

pub use redis_stream::{PAYLOAD_FIELD, RedisClickStream, RedisStreamConnector};
