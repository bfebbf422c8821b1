//! Port for seller and delivery-partner account storage.

use async_trait::async_trait;

use crate::domain::{
    Account, AccountId, AccountRole, EmailAddress, PartnerProfileUpdate, PasswordHash,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "account repository query failed: {message}",
        /// Another account of the same role already uses the address.
        DuplicateEmail { email: String } =>
            "an account with email {email} already exists",
    }
}

/// Port for reading and writing accounts. Lookups are scoped by role since
/// sellers and partners live in separate directories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new account.
    async fn insert(&self, account: &Account) -> Result<(), AccountRepositoryError>;

    /// Look up an account in the `role` directory.
    async fn find_by_id(
        &self,
        role: AccountRole,
        id: &AccountId,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Look up by normalised address in the `role` directory.
    async fn find_by_email(
        &self,
        role: AccountRole,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Flag the address as verified. Returns `false` when the account is gone.
    async fn mark_email_verified(
        &self,
        role: AccountRole,
        id: &AccountId,
    ) -> Result<bool, AccountRepositoryError>;

    /// Replace the stored credential hash. Returns `false` when absent.
    async fn update_password_hash(
        &self,
        role: AccountRole,
        id: &AccountId,
        password_hash: &PasswordHash,
    ) -> Result<bool, AccountRepositoryError>;

    /// Apply a coverage/capacity update to a partner account.
    async fn update_partner_profile(
        &self,
        id: &AccountId,
        update: &PartnerProfileUpdate,
    ) -> Result<Option<Account>, AccountRepositoryError>;
}
