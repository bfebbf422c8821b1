//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel
//! - **memory**: single-process repositories with the same semantics
//! - **cache**: Redis or in-process token denylist and verification codes
//! - **security**: signing key, access tokens, signed links, password hashing
//! - **notify**: queued notification delivery
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod memory;
pub mod notify;
pub mod persistence;
pub mod security;
