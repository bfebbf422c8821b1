//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the account and shipment repository ports
//! backed by PostgreSQL via `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Partner selection itself is the domain's `find_partner_for`; the
//!   adapter only supplies a locked snapshot of candidates.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Atomic units**: placement and status changes each run in a single
//!   transaction.
//!
//! # Example
//!
//! ```no_run
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! use shiptrack::outbound::persistence::{
//!     DbPool, DieselAccountRepository, DieselShipmentRepository, PoolConfig,
//! };
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/shiptrack")).await?;
//! let accounts = DieselAccountRepository::new(pool.clone());
//! let shipments = DieselShipmentRepository::new(pool);
//! # Ok(())
//! # }
//! ```

mod diesel_account_repository;
mod diesel_basic_error_mapping;
mod diesel_shipment_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use diesel_shipment_repository::DieselShipmentRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
