//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod access_tokens;
mod account_command;
mod account_repository;
mod notifier;
mod password_hasher;
mod shipment_command;
mod shipment_query;
mod shipment_repository;
mod signed_links;
mod token_authenticator;
mod token_revocation;
mod verification_codes;

#[cfg(test)]
pub use access_tokens::MockAccessTokens;
pub use access_tokens::{AccessTokenError, AccessTokens};
pub use account_command::AccountCommand;
#[cfg(test)]
pub use account_command::MockAccountCommand;
#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notification, NotificationTemplate, Notifier};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use shipment_command::MockShipmentCommand;
pub use shipment_command::{
    CreateShipmentRequest, SellerShipmentRequest, ShipmentCommand, UpdateShipmentRequest,
};
#[cfg(test)]
pub use shipment_query::MockShipmentQuery;
pub use shipment_query::ShipmentQuery;
#[cfg(test)]
pub use shipment_repository::MockShipmentRepository;
pub use shipment_repository::{ShipmentRepository, ShipmentRepositoryError};
#[cfg(test)]
pub use signed_links::MockSignedLinks;
pub use signed_links::{SignedLinkError, SignedLinks};
#[cfg(test)]
pub use token_authenticator::MockTokenAuthenticator;
pub use token_authenticator::TokenAuthenticator;
#[cfg(test)]
pub use token_revocation::MockTokenRevocationStore;
pub use token_revocation::{TokenRevocationError, TokenRevocationStore};
#[cfg(test)]
pub use verification_codes::MockVerificationCodeStore;
pub use verification_codes::{VerificationCodeStore, VerificationCodeStoreError};
