//! Builders wiring outbound adapters into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use shiptrack::domain::ports::{
    AccountRepository, Notifier, ShipmentRepository, TokenRevocationStore, VerificationCodeStore,
};
use shiptrack::domain::{
    AccountCollaborators, AccountService, AccountServiceConfig, ShipmentCollaborators,
    ShipmentCommandService, ShipmentQueryService,
};
use shiptrack::inbound::http::state::HttpState;
use shiptrack::outbound::cache::{
    MemoryTokenRevocationStore, MemoryVerificationCodeStore, RedisPool,
    RedisTokenRevocationStore, RedisVerificationCodeStore,
};
use shiptrack::outbound::memory::MemoryStore;
use shiptrack::outbound::persistence::{DieselAccountRepository, DieselShipmentRepository};
use shiptrack::outbound::security::{
    Argon2PasswordHasher, HmacSignedLinks, JwtAccessTokens, SigningKey,
};

use super::ServerConfig;

/// Adapters shared by every repository backend.
struct SharedAdapters {
    signing_key: SigningKey,
    revocations: Arc<dyn TokenRevocationStore>,
    codes: Arc<dyn VerificationCodeStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

fn build_stores(
    redis: Option<&RedisPool>,
) -> (Arc<dyn TokenRevocationStore>, Arc<dyn VerificationCodeStore>) {
    match redis {
        Some(pool) => {
            info!("using Redis for token revocations and verification codes");
            (
                Arc::new(RedisTokenRevocationStore::new(pool.clone())),
                Arc::new(RedisVerificationCodeStore::new(pool.clone())),
            )
        }
        None => {
            info!("using in-process token revocations and verification codes");
            (
                Arc::new(MemoryTokenRevocationStore::new()),
                Arc::new(MemoryVerificationCodeStore::new()),
            )
        }
    }
}

fn assemble<A, S>(
    accounts: Arc<A>,
    shipments: Arc<S>,
    shared: SharedAdapters,
    config: AccountServiceConfig,
) -> HttpState
where
    A: AccountRepository + 'static,
    S: ShipmentRepository + 'static,
{
    let account_service = Arc::new(AccountService::new(
        Arc::clone(&accounts),
        AccountCollaborators {
            hasher: Arc::new(Argon2PasswordHasher::new()),
            tokens: Arc::new(JwtAccessTokens::new(&shared.signing_key)),
            revocations: shared.revocations,
            links: Arc::new(HmacSignedLinks::new(&shared.signing_key)),
            notifier: Arc::clone(&shared.notifier),
            clock: Arc::clone(&shared.clock),
        },
        config,
    ));
    let shipment_command = Arc::new(ShipmentCommandService::new(
        Arc::clone(&shipments),
        accounts,
        ShipmentCollaborators {
            codes: shared.codes,
            notifier: shared.notifier,
            clock: shared.clock,
        },
    ));

    HttpState {
        accounts: account_service.clone(),
        authenticator: account_service,
        shipments: shipment_command,
        shipments_query: Arc::new(ShipmentQueryService::new(shipments)),
    }
}

/// Build the HTTP state from the configured backends.
///
/// Diesel repositories are used when a pool is configured, otherwise a
/// single in-memory store backs both accounts and shipments.
pub(super) fn build_http_state(
    config: &ServerConfig,
    notifier: Arc<dyn Notifier>,
) -> web::Data<HttpState> {
    let (revocations, codes) = build_stores(config.redis_pool.as_ref());
    let shared = SharedAdapters {
        signing_key: config.signing_key.clone(),
        revocations,
        codes,
        notifier,
        clock: Arc::new(DefaultClock),
    };

    let state = match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL persistence");
            assemble(
                Arc::new(DieselAccountRepository::new(pool.clone())),
                Arc::new(DieselShipmentRepository::new(pool.clone())),
                shared,
                config.accounts.clone(),
            )
        }
        None => {
            info!("using in-memory persistence; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            assemble(Arc::clone(&store), store, shared, config.accounts.clone())
        }
    };
    web::Data::new(state)
}
