//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use shiptrack::domain::AccountServiceConfig;
use shiptrack::outbound::cache::RedisPool;
use shiptrack::outbound::notify::{LogMailTransport, MailTransport};
use shiptrack::outbound::persistence::DbPool;
use shiptrack::outbound::security::SigningKey;

const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) signing_key: SigningKey,
    pub(crate) accounts: AccountServiceConfig,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) redis_pool: Option<RedisPool>,
    pub(crate) mail_transport: Arc<dyn MailTransport>,
    pub(crate) queue_capacity: usize,
}

impl ServerConfig {
    /// Construct a configuration backed by in-memory adapters and a logging
    /// mail transport.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        signing_key: SigningKey,
        accounts: AccountServiceConfig,
    ) -> Self {
        Self {
            bind_addr,
            signing_key,
            accounts,
            db_pool: None,
            redis_pool: None,
            mail_transport: Arc::new(LogMailTransport),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Attach a database connection pool for the account and shipment
    /// repositories.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Keep revocations and verification codes in Redis.
    #[must_use]
    pub fn with_redis_pool(mut self, pool: RedisPool) -> Self {
        self.redis_pool = Some(pool);
        self
    }

    /// Send notifications through `transport`.
    #[must_use]
    pub fn with_mail_transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.mail_transport = transport;
        self
    }

    /// Bound the notification queue.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}
