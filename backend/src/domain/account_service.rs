//! Account directory services.
//!
//! Implements signup, login, logout and the link-gated email-verification
//! and password-reset flows for both sellers and delivery partners, plus
//! bearer-token authentication for inbound adapters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    AccessTokenError, AccessTokens, AccountCommand, AccountRepository, AccountRepositoryError,
    Notification, NotificationTemplate, Notifier, PasswordHasher, PasswordHasherError,
    SignedLinkError, SignedLinks, TokenAuthenticator, TokenRevocationError, TokenRevocationStore,
};
use crate::domain::{
    AccessClaims, Account, AccountId, AccountRole, EmailAddress, Error, IssuedToken, LinkClaims,
    LinkPurpose, LoginCredentials, NewPassword, PartnerProfileUpdate, Principal, SignupDraft,
};

const INVALID_LINK: &str = "invalid token";

fn map_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account repository unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account repository error: {message}"))
        }
        AccountRepositoryError::DuplicateEmail { .. } => {
            Error::conflict("an account with this email already exists")
        }
    }
}

fn require_found(found: Result<bool, AccountRepositoryError>, id: AccountId) -> Result<(), Error> {
    if found.map_err(map_repository_error)? {
        Ok(())
    } else {
        Err(Error::not_found(format!("account {id} not found")))
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(error.to_string())
}

fn map_revocation_error(error: TokenRevocationError) -> Error {
    Error::service_unavailable(format!("token revocation store unavailable: {error}"))
}

fn map_link_error(error: SignedLinkError) -> Error {
    match error {
        SignedLinkError::Expired | SignedLinkError::Invalid { .. } => {
            debug!(%error, "account link rejected");
            Error::invalid_request(INVALID_LINK)
        }
        SignedLinkError::Encode { message } => Error::internal(message),
    }
}

/// Tunables for account flows.
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    /// Externally reachable origin used to build account links.
    pub public_base_url: String,
    /// Lifetime of issued access tokens.
    pub access_token_ttl: Duration,
}

/// Collaborators the account service reaches through trait objects.
#[derive(Clone)]
pub struct AccountCollaborators {
    /// Credential hashing.
    pub hasher: Arc<dyn PasswordHasher>,
    /// Access token signing.
    pub tokens: Arc<dyn AccessTokens>,
    /// Logout denylist.
    pub revocations: Arc<dyn TokenRevocationStore>,
    /// Verification and reset link signing.
    pub links: Arc<dyn SignedLinks>,
    /// Outgoing mail.
    pub notifier: Arc<dyn Notifier>,
    /// Time source for tokens and links.
    pub clock: Arc<dyn Clock>,
}

/// Account service implementing [`AccountCommand`] and
/// [`TokenAuthenticator`].
#[derive(Clone)]
pub struct AccountService<R> {
    accounts: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn AccessTokens>,
    revocations: Arc<dyn TokenRevocationStore>,
    links: Arc<dyn SignedLinks>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: AccountServiceConfig,
}

impl<R> AccountService<R> {
    /// Create a new account service.
    pub fn new(
        accounts: Arc<R>,
        collaborators: AccountCollaborators,
        config: AccountServiceConfig,
    ) -> Self {
        Self {
            accounts,
            hasher: collaborators.hasher,
            tokens: collaborators.tokens,
            revocations: collaborators.revocations,
            links: collaborators.links,
            notifier: collaborators.notifier,
            clock: collaborators.clock,
            config,
        }
    }

    /// Build the absolute URL a link token is delivered under.
    fn link_url(&self, role: AccountRole, purpose: LinkPurpose, token: &str) -> String {
        format!(
            "{}/api/v1/{}/{}?token={token}",
            self.config.public_base_url.trim_end_matches('/'),
            role.route_prefix(),
            purpose.path(),
        )
    }

    fn mint_link(&self, account: &Account, purpose: LinkPurpose) -> Result<String, Error> {
        let claims = LinkClaims {
            account_id: account.id(),
            role: account.role(),
            email: account.email().clone(),
        };
        let token = self
            .links
            .sign(purpose, &claims, self.clock.utc())
            .map_err(map_link_error)?;
        Ok(self.link_url(account.role(), purpose, &token))
    }
}

impl<R> AccountService<R>
where
    R: AccountRepository,
{
    /// Resolve a link token to the account it was minted for.
    async fn redeem_link(
        &self,
        role: AccountRole,
        purpose: LinkPurpose,
        token: &str,
    ) -> Result<Account, Error> {
        let claims = self
            .links
            .verify(purpose, token, self.clock.utc())
            .map_err(map_link_error)?;
        if claims.role != role {
            return Err(Error::invalid_request(INVALID_LINK));
        }
        let account = self
            .accounts
            .find_by_id(role, &claims.account_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("account not found"))?;
        if account.email() != &claims.email {
            return Err(Error::invalid_request(INVALID_LINK));
        }
        Ok(account)
    }
}

#[async_trait]
impl<R> AccountCommand for AccountService<R>
where
    R: AccountRepository,
{
    async fn signup(&self, draft: SignupDraft) -> Result<Account, Error> {
        let password_hash = self
            .hasher
            .hash(draft.password().expose())
            .map_err(map_hasher_error)?;
        let account = draft.into_account(AccountId::random(), password_hash, self.clock.utc());

        self.accounts
            .insert(&account)
            .await
            .map_err(map_repository_error)?;

        let verification_url = self.mint_link(&account, LinkPurpose::EmailVerification)?;
        self.notifier.dispatch(Notification {
            recipients: vec![account.email().clone()],
            subject: "Verify your shiptrack account".to_owned(),
            template: NotificationTemplate::VerifyEmail,
            context: json!({
                "name": account.name(),
                "verificationUrl": verification_url,
            }),
        });

        info!(account_id = %account.id(), role = %account.role(), "account registered");
        Ok(account)
    }

    async fn login(
        &self,
        role: AccountRole,
        credentials: LoginCredentials,
    ) -> Result<IssuedToken, Error> {
        let account = self
            .accounts
            .find_by_email(role, credentials.email())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("account not found"))?;

        let matches = self
            .hasher
            .verify(credentials.password(), account.password_hash())
            .map_err(map_hasher_error)?;
        if !matches {
            info!(account_id = %account.id(), %role, "login rejected");
            return Err(Error::invalid_request("invalid credentials"));
        }
        if !account.email_verified() {
            return Err(Error::unauthorized("email address not verified"));
        }

        let claims = AccessClaims::new(
            account.id(),
            role,
            account.name(),
            self.clock.utc(),
            self.config.access_token_ttl,
        );
        let token = self
            .tokens
            .issue(&claims)
            .map_err(|error| Error::internal(error.to_string()))?;

        info!(account_id = %account.id(), %role, token_id = %claims.token_id, "access token issued");
        Ok(IssuedToken { token, claims })
    }

    async fn logout(&self, claims: AccessClaims) -> Result<(), Error> {
        let ttl = claims.remaining_lifetime(self.clock.utc());
        self.revocations
            .revoke(&claims.token_id, ttl)
            .await
            .map_err(map_revocation_error)?;
        info!(account_id = %claims.subject, token_id = %claims.token_id, "access token revoked");
        Ok(())
    }

    async fn verify_email(&self, role: AccountRole, token: String) -> Result<(), Error> {
        let account = self
            .redeem_link(role, LinkPurpose::EmailVerification, &token)
            .await?;
        if account.email_verified() {
            return Ok(());
        }
        let found = self.accounts.mark_email_verified(role, &account.id()).await;
        require_found(found, account.id())?;
        info!(account_id = %account.id(), %role, "email verified");
        Ok(())
    }

    async fn request_password_reset(
        &self,
        role: AccountRole,
        email: EmailAddress,
    ) -> Result<(), Error> {
        let Some(account) = self
            .accounts
            .find_by_email(role, &email)
            .await
            .map_err(map_repository_error)?
        else {
            debug!(%role, "password reset requested for unknown address");
            return Ok(());
        };

        let reset_url = self.mint_link(&account, LinkPurpose::PasswordReset)?;
        self.notifier.dispatch(Notification {
            recipients: vec![account.email().clone()],
            subject: "shiptrack account password reset".to_owned(),
            template: NotificationTemplate::PasswordReset,
            context: json!({
                "name": account.name(),
                "resetUrl": reset_url,
            }),
        });
        info!(account_id = %account.id(), %role, "password reset link sent");
        Ok(())
    }

    async fn reset_password(
        &self,
        role: AccountRole,
        token: String,
        password: NewPassword,
    ) -> Result<(), Error> {
        let account = self
            .redeem_link(role, LinkPurpose::PasswordReset, &token)
            .await?;
        let password_hash = self
            .hasher
            .hash(password.expose())
            .map_err(map_hasher_error)?;
        let found = self
            .accounts
            .update_password_hash(role, &account.id(), &password_hash)
            .await;
        require_found(found, account.id())?;
        info!(account_id = %account.id(), %role, "password reset");
        Ok(())
    }

    async fn update_partner_profile(
        &self,
        partner: Principal,
        update: PartnerProfileUpdate,
    ) -> Result<Account, Error> {
        if partner.role != AccountRole::Partner {
            return Err(Error::forbidden("only partners can update a partner profile"));
        }
        self.accounts
            .update_partner_profile(&partner.id, &update)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("account {} not found", partner.id)))
    }
}

#[async_trait]
impl<R> TokenAuthenticator for AccountService<R>
where
    R: AccountRepository,
{
    async fn authenticate(&self, token: &str) -> Result<AccessClaims, Error> {
        let claims = self
            .tokens
            .validate(token, self.clock.utc())
            .map_err(|error| match error {
                AccessTokenError::Expired => Error::unauthorized("access token expired"),
                AccessTokenError::Invalid { .. } => {
                    debug!(%error, "bearer token rejected");
                    Error::unauthorized("invalid access token")
                }
                AccessTokenError::Issue { message } => Error::internal(message),
            })?;

        let revoked = self
            .revocations
            .is_revoked(&claims.token_id)
            .await
            .map_err(map_revocation_error)?;
        if revoked {
            return Err(Error::unauthorized("access token revoked"));
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
