//! In-process expiring stores used when Redis is not configured.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{
    TokenRevocationError, TokenRevocationStore, VerificationCodeStore, VerificationCodeStoreError,
};
use crate::domain::{ShipmentId, TokenId, VerificationCode};

/// Map whose entries lapse after their TTL. Expired entries are dropped on
/// access and whenever a write happens.
#[derive(Debug)]
struct ExpiringMap<K, V> {
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K, V> Default for ExpiringMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    async fn insert(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, deadline)| *deadline > now);
        entries.insert(key, (value, now + ttl));
    }

    async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((value, deadline)) if *deadline > now => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn remove(&self, key: &K) {
        self.entries.lock().await.remove(key);
    }
}

/// Access-token denylist held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenRevocationStore {
    revoked: Arc<ExpiringMap<TokenId, ()>>,
}

impl MemoryTokenRevocationStore {
    /// Empty denylist.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRevocationStore for MemoryTokenRevocationStore {
    async fn revoke(&self, token_id: &TokenId, ttl: Duration) -> Result<(), TokenRevocationError> {
        self.revoked.insert(*token_id, (), ttl).await;
        Ok(())
    }

    async fn is_revoked(&self, token_id: &TokenId) -> Result<bool, TokenRevocationError> {
        Ok(self.revoked.get(token_id).await.is_some())
    }
}

/// Verification codes held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryVerificationCodeStore {
    codes: Arc<ExpiringMap<ShipmentId, VerificationCode>>,
}

impl MemoryVerificationCodeStore {
    /// Empty code store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationCodeStore for MemoryVerificationCodeStore {
    async fn store(
        &self,
        shipment_id: &ShipmentId,
        code: &VerificationCode,
        ttl: Duration,
    ) -> Result<(), VerificationCodeStoreError> {
        self.codes.insert(*shipment_id, code.clone(), ttl).await;
        Ok(())
    }

    async fn get_code(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<VerificationCode>, VerificationCodeStoreError> {
        Ok(self.codes.get(shipment_id).await)
    }

    async fn remove(&self, shipment_id: &ShipmentId) -> Result<(), VerificationCodeStoreError> {
        self.codes.remove(shipment_id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn revocations_hold_until_they_lapse() {
        let store = MemoryTokenRevocationStore::new();
        let live = TokenId::random();
        let lapsed = TokenId::random();

        store
            .revoke(&live, Duration::from_secs(60))
            .await
            .expect("revoke");
        store.revoke(&lapsed, Duration::ZERO).await.expect("revoke");

        assert!(store.is_revoked(&live).await.expect("lookup"));
        assert!(!store.is_revoked(&lapsed).await.expect("lookup"));
        assert!(!store.is_revoked(&TokenId::random()).await.expect("lookup"));
    }

    #[rstest]
    #[tokio::test]
    async fn codes_are_returned_until_expiry() {
        let store = MemoryVerificationCodeStore::new();
        let shipment_id = ShipmentId::random();
        let code = VerificationCode::parse("042917").expect("valid code");

        store
            .store(&shipment_id, &code, Duration::from_secs(60))
            .await
            .expect("store");
        let loaded = store.get_code(&shipment_id).await.expect("lookup");
        assert_eq!(loaded.map(|c| c.as_str().to_owned()), Some("042917".to_owned()));

        store
            .store(&shipment_id, &code, Duration::ZERO)
            .await
            .expect("store");
        assert!(store.get_code(&shipment_id).await.expect("lookup").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn removed_codes_are_gone() {
        let store = MemoryVerificationCodeStore::new();
        let shipment_id = ShipmentId::random();
        let code = VerificationCode::parse("731004").expect("valid code");
        store
            .store(&shipment_id, &code, Duration::from_secs(60))
            .await
            .expect("store");

        store.remove(&shipment_id).await.expect("remove");
        store.remove(&shipment_id).await.expect("absent entries are fine");

        assert!(store.get_code(&shipment_id).await.expect("lookup").is_none());
    }
}
