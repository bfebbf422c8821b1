//! Redis-backed token revocation and verification code stores.
//!
//! Both stores share one `bb8-redis` pool. Entries carry a TTL, so Redis
//! expires them without a sweeper.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, RedisError};
use tracing::{debug, warn};

use crate::domain::ports::{
    TokenRevocationError, TokenRevocationStore, VerificationCodeStore, VerificationCodeStoreError,
};
use crate::domain::{ShipmentId, TokenId, VerificationCode};

const KEY_PREFIX: &str = "shiptrack";

/// Connection pool shared by the Redis stores.
pub type RedisPool = Pool<RedisConnectionManager>;

/// Failure while building the Redis pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to build redis pool: {message}")]
pub struct RedisPoolError {
    /// Reason reported by the pool builder.
    pub message: String,
}

/// Build a lazily connecting pool for `redis_url`.
pub async fn connect_redis(redis_url: &str, max_size: u32) -> Result<RedisPool, RedisPoolError> {
    let manager = RedisConnectionManager::new(redis_url).map_err(|error| RedisPoolError {
        message: error.to_string(),
    })?;
    Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_secs(5))
        .build(manager)
        .await
        .map_err(|error| RedisPoolError {
            message: error.to_string(),
        })
}

fn revocation_key(token_id: &TokenId) -> String {
    format!("{KEY_PREFIX}:revoked:{token_id}")
}

fn code_key(shipment_id: &ShipmentId) -> String {
    format!("{KEY_PREFIX}:shipment-code:{shipment_id}")
}

/// Redis rejects `EX 0`, so sub-second TTLs round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

async fn checkout<E>(
    pool: &RedisPool,
    connection: impl FnOnce(String) -> E,
) -> Result<PooledConnection<'_, RedisConnectionManager>, E> {
    pool.get().await.map_err(|error: RunError<RedisError>| {
        warn!(%error, "redis checkout failed");
        connection(error.to_string())
    })
}

/// Access-token denylist keyed by `shiptrack:revoked:{jti}`.
#[derive(Clone)]
pub struct RedisTokenRevocationStore {
    pool: RedisPool,
}

impl RedisTokenRevocationStore {
    /// Denylist over `pool`.
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRevocationStore for RedisTokenRevocationStore {
    async fn revoke(&self, token_id: &TokenId, ttl: Duration) -> Result<(), TokenRevocationError> {
        let mut conn = checkout(&self.pool, TokenRevocationError::connection).await?;
        let key = revocation_key(token_id);
        let _: () = redis::cmd("SET")
            .arg(&key)
            .arg(1)
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .query_async(&mut *conn)
            .await
            .map_err(|error| TokenRevocationError::backend(error.to_string()))?;
        debug!(%token_id, ttl_secs = ttl_seconds(ttl), "token revocation recorded");
        Ok(())
    }

    async fn is_revoked(&self, token_id: &TokenId) -> Result<bool, TokenRevocationError> {
        let mut conn = checkout(&self.pool, TokenRevocationError::connection).await?;
        redis::cmd("EXISTS")
            .arg(revocation_key(token_id))
            .query_async(&mut *conn)
            .await
            .map_err(|error| TokenRevocationError::backend(error.to_string()))
    }
}

/// Delivery verification codes keyed by `shiptrack:shipment-code:{id}`.
#[derive(Clone)]
pub struct RedisVerificationCodeStore {
    pool: RedisPool,
}

impl RedisVerificationCodeStore {
    /// Code store over `pool`.
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationCodeStore for RedisVerificationCodeStore {
    async fn store(
        &self,
        shipment_id: &ShipmentId,
        code: &VerificationCode,
        ttl: Duration,
    ) -> Result<(), VerificationCodeStoreError> {
        let mut conn = checkout(&self.pool, VerificationCodeStoreError::connection).await?;
        let _: () = redis::cmd("SET")
            .arg(code_key(shipment_id))
            .arg(code.as_str())
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .query_async(&mut *conn)
            .await
            .map_err(|error| VerificationCodeStoreError::backend(error.to_string()))?;
        Ok(())
    }

    async fn get_code(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<VerificationCode>, VerificationCodeStoreError> {
        let mut conn = checkout(&self.pool, VerificationCodeStoreError::connection).await?;
        let stored: Option<String> = redis::cmd("GET")
            .arg(code_key(shipment_id))
            .query_async(&mut *conn)
            .await
            .map_err(|error| VerificationCodeStoreError::backend(error.to_string()))?;

        Ok(stored.and_then(|raw| {
            let code = VerificationCode::parse(&raw);
            if code.is_none() {
                warn!(%shipment_id, "discarding malformed stored verification code");
            }
            code
        }))
    }

    async fn remove(&self, shipment_id: &ShipmentId) -> Result<(), VerificationCodeStoreError> {
        let mut conn = checkout(&self.pool, VerificationCodeStoreError::connection).await?;
        let _: u64 = redis::cmd("DEL")
            .arg(code_key(shipment_id))
            .query_async(&mut *conn)
            .await
            .map_err(|error| VerificationCodeStoreError::backend(error.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    fn keys_are_namespaced() {
        let token_id = TokenId::from_uuid(Uuid::nil());
        let shipment_id = ShipmentId::from_uuid(Uuid::nil());

        assert_eq!(
            revocation_key(&token_id),
            "shiptrack:revoked:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            code_key(&shipment_id),
            "shiptrack:shipment-code:00000000-0000-0000-0000-000000000000"
        );
    }

    #[rstest]
    #[case(Duration::ZERO, 1)]
    #[case(Duration::from_millis(1_500), 1)]
    #[case(Duration::from_secs(90), 90)]
    fn ttl_never_drops_below_one_second(#[case] ttl: Duration, #[case] expected: u64) {
        assert_eq!(ttl_seconds(ttl), expected);
    }

    #[rstest]
    fn invalid_urls_fail_pool_construction() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let error = runtime
            .block_on(connect_redis("not a url", 1))
            .expect_err("url must parse");
        assert!(error.to_string().contains("redis pool"));
    }
}
