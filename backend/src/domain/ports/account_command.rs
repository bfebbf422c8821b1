//! Driving port for account use-cases: signup, login, logout and the
//! link-gated verification and password-reset flows.

use async_trait::async_trait;

use crate::domain::{
    AccessClaims, Account, AccountRole, EmailAddress, Error, IssuedToken, LoginCredentials,
    NewPassword, PartnerProfileUpdate, Principal, SignupDraft,
};

/// Account use-cases behind the HTTP handlers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Register an unverified account and mail its verification link.
    async fn signup(&self, draft: SignupDraft) -> Result<Account, Error>;

    /// Check credentials and issue an access token.
    async fn login(
        &self,
        role: AccountRole,
        credentials: LoginCredentials,
    ) -> Result<IssuedToken, Error>;

    /// Revoke the presented token for the rest of its lifetime.
    async fn logout(&self, claims: AccessClaims) -> Result<(), Error>;

    /// Mark the account behind a verification link as verified.
    async fn verify_email(&self, role: AccountRole, token: String) -> Result<(), Error>;

    /// Mail a reset link when the address is known; succeeds silently
    /// otherwise.
    async fn request_password_reset(
        &self,
        role: AccountRole,
        email: EmailAddress,
    ) -> Result<(), Error>;

    /// Replace the password of the account behind a reset link.
    async fn reset_password(
        &self,
        role: AccountRole,
        token: String,
        password: NewPassword,
    ) -> Result<(), Error>;

    /// Change a partner's coverage or capacity.
    async fn update_partner_profile(
        &self,
        partner: Principal,
        update: PartnerProfileUpdate,
    ) -> Result<Account, Error>;
}
