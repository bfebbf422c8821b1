//! Short-lived key/value state: the access-token denylist and delivery
//! verification codes.
//!
//! With a Redis URL configured both stores live in Redis behind a shared
//! `bb8-redis` pool; otherwise the in-process equivalents keep the same
//! expiry semantics for a single node.

mod memory;
mod redis_store;

pub use memory::{MemoryTokenRevocationStore, MemoryVerificationCodeStore};
pub use redis_store::{
    RedisPool, RedisPoolError, RedisTokenRevocationStore, RedisVerificationCodeStore,
    connect_redis,
};
