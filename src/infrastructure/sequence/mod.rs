//! Shared ID sequence backed by Redis.

mod redis_sequence;

pub use redis_sequence::RedisSequenceStore;
