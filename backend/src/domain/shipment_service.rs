//! Shipment lifecycle services.
//!
//! The command service owns creation, partner updates, cancellation and
//! deletion; the query service serves reads. Both enforce that only the
//! owning seller or the assigned partner touches a shipment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, CreateShipmentRequest, Notification,
    NotificationTemplate, Notifier, SellerShipmentRequest, ShipmentCommand, ShipmentQuery,
    ShipmentRepository, ShipmentRepositoryError, UpdateShipmentRequest, VerificationCodeStore,
    VerificationCodeStoreError,
};
use crate::domain::{
    Account, AccountId, AccountRole, Error, NewShipment, Principal, Shipment, ShipmentChange,
    ShipmentId, ShipmentStatus, TransitionError, VerificationCode,
};

/// How long a delivery verification code stays retrievable.
pub const VERIFICATION_CODE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const NOT_AUTHORIZED: &str = "client not authorized";

fn map_repository_error(error: ShipmentRepositoryError) -> Error {
    match error {
        ShipmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("shipment repository unavailable: {message}"))
        }
        ShipmentRepositoryError::Query { message } => {
            Error::internal(format!("shipment repository error: {message}"))
        }
        ShipmentRepositoryError::NoPartnerAvailable { destination } => Error::not_acceptable(
            format!("no delivery partner available for zip code {destination}"),
        ),
        ShipmentRepositoryError::NotFound { shipment_id } => {
            Error::not_found(format!("shipment {shipment_id} not found"))
        }
        ShipmentRepositoryError::StatusConflict { shipment_id } => {
            Error::conflict(format!("shipment {shipment_id} was modified concurrently"))
        }
    }
}

fn map_account_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account repository unavailable: {message}"))
        }
        AccountRepositoryError::Query { message }
        | AccountRepositoryError::DuplicateEmail { email: message } => {
            Error::internal(format!("account repository error: {message}"))
        }
    }
}

fn map_code_store_error(error: VerificationCodeStoreError) -> Error {
    match error {
        VerificationCodeStoreError::Connection { message } => Error::service_unavailable(
            format!("verification code store unavailable: {message}"),
        ),
        VerificationCodeStoreError::Backend { message } => {
            Error::service_unavailable(format!("verification code store error: {message}"))
        }
    }
}

fn map_transition_error(error: TransitionError) -> Error {
    if error.is_conflict() {
        Error::conflict(error.to_string())
    } else {
        Error::invalid_request(error.to_string())
    }
}

fn require_role(principal: Principal, role: AccountRole, action: &str) -> Result<(), Error> {
    if principal.role == role {
        return Ok(());
    }
    Err(Error::forbidden(format!(
        "only {} can {action}",
        role.route_prefix()
    )))
}

async fn load_shipment<R>(repo: &R, shipment_id: &ShipmentId) -> Result<Shipment, Error>
where
    R: ShipmentRepository + ?Sized,
{
    repo.find_by_id(shipment_id)
        .await
        .map_err(map_repository_error)?
        .ok_or_else(|| Error::not_found(format!("shipment {shipment_id} not found")))
}

/// Collaborators the command service reaches through trait objects.
#[derive(Clone)]
pub struct ShipmentCollaborators {
    /// Delivery code storage.
    pub codes: Arc<dyn VerificationCodeStore>,
    /// Outgoing mail.
    pub notifier: Arc<dyn Notifier>,
    /// Time source for events and estimates.
    pub clock: Arc<dyn Clock>,
}

/// Shipment service implementing the command driving port.
#[derive(Clone)]
pub struct ShipmentCommandService<R, A> {
    shipments: Arc<R>,
    accounts: Arc<A>,
    codes: Arc<dyn VerificationCodeStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl<R, A> ShipmentCommandService<R, A> {
    /// Create a new command service.
    pub fn new(shipments: Arc<R>, accounts: Arc<A>, collaborators: ShipmentCollaborators) -> Self {
        Self {
            shipments,
            accounts,
            codes: collaborators.codes,
            notifier: collaborators.notifier,
            clock: collaborators.clock,
        }
    }
}

impl<R, A> ShipmentCommandService<R, A>
where
    R: ShipmentRepository,
    A: AccountRepository,
{
    /// Resolve a notification recipient; lookup failures are logged and
    /// skipped.
    async fn recipient(&self, role: AccountRole, id: AccountId) -> Option<Account> {
        match self.accounts.find_by_id(role, &id).await {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                warn!(%id, %role, "notification recipient not found");
                None
            }
            Err(error) => {
                warn!(%id, %role, %error, "notification recipient lookup failed");
                None
            }
        }
    }

    fn notify(
        &self,
        account: &Account,
        template: NotificationTemplate,
        subject: String,
        mut context: serde_json::Value,
    ) {
        if let Some(fields) = context.as_object_mut() {
            fields.insert("name".to_owned(), json!(account.name()));
        }
        self.notifier.dispatch(Notification {
            recipients: vec![account.email().clone()],
            subject,
            template,
            context,
        });
    }

    async fn check_delivery_code(
        &self,
        shipment_id: &ShipmentId,
        supplied: Option<&str>,
    ) -> Result<(), Error> {
        let stored = self
            .codes
            .get_code(shipment_id)
            .await
            .map_err(map_code_store_error)?;
        match (stored, supplied) {
            (Some(code), Some(candidate)) if code.matches(candidate) => Ok(()),
            _ => {
                warn!(%shipment_id, "delivery verification code rejected");
                Err(Error::unauthorized(NOT_AUTHORIZED))
            }
        }
    }
}

#[async_trait]
impl<R, A> ShipmentCommand for ShipmentCommandService<R, A>
where
    R: ShipmentRepository,
    A: AccountRepository,
{
    async fn create(&self, request: CreateShipmentRequest) -> Result<Shipment, Error> {
        let CreateShipmentRequest { seller, draft } = request;
        require_role(seller, AccountRole::Seller, "create shipments")?;

        let account = self
            .accounts
            .find_by_id(AccountRole::Seller, &seller.id)
            .await
            .map_err(map_account_error)?
            .ok_or_else(|| Error::unauthorized("seller account not found"))?;
        let origin = account
            .seller_zip_code()
            .ok_or_else(|| Error::internal("seller account has no pickup zip code"))?;

        let new_shipment = NewShipment::place(draft, account.id(), origin, self.clock.utc());
        let shipment_id = new_shipment.id;

        let code = VerificationCode::generate();
        self.codes
            .store(&shipment_id, &code, VERIFICATION_CODE_TTL)
            .await
            .map_err(map_code_store_error)?;

        let shipment = match self.shipments.create_assigned(new_shipment).await {
            Ok(shipment) => shipment,
            Err(error) => {
                if matches!(error, ShipmentRepositoryError::NoPartnerAvailable { .. }) {
                    info!(%shipment_id, %error, "shipment rejected");
                }
                if let Err(cleanup) = self.codes.remove(&shipment_id).await {
                    warn!(%shipment_id, error = %cleanup, "failed to discard verification code");
                }
                return Err(map_repository_error(error));
            }
        };

        info!(
            %shipment_id,
            seller_id = %shipment.seller_id(),
            partner_id = %shipment.partner_id(),
            destination = %shipment.destination(),
            "shipment placed"
        );

        let partner = self
            .recipient(AccountRole::Partner, shipment.partner_id())
            .await;
        self.notify(
            &account,
            NotificationTemplate::ShipmentPlaced,
            "shipment placed".to_owned(),
            json!({
                "shipmentId": shipment_id.to_string(),
                "verificationCode": code.as_str(),
                "partnerName": partner.as_ref().map(Account::name),
                "estimatedDelivery": shipment.estimated_delivery(),
            }),
        );
        if let Some(partner) = &partner {
            self.notify(
                partner,
                NotificationTemplate::ShipmentAssigned,
                "new shipment assigned".to_owned(),
                json!({
                    "shipmentId": shipment_id.to_string(),
                    "destination": shipment.destination().value(),
                }),
            );
        }

        Ok(shipment)
    }

    async fn update(&self, request: UpdateShipmentRequest) -> Result<Shipment, Error> {
        let UpdateShipmentRequest {
            partner,
            shipment_id,
            update,
        } = request;
        require_role(partner, AccountRole::Partner, "update shipments")?;

        let shipment = load_shipment(self.shipments.as_ref(), &shipment_id).await?;
        if !shipment.is_assigned_to(partner.id) {
            return Err(Error::unauthorized(NOT_AUTHORIZED));
        }

        let change = ShipmentChange::for_update(&shipment, &update, self.clock.utc())
            .map_err(map_transition_error)?;
        if update.status() == Some(ShipmentStatus::Delivered) {
            self.check_delivery_code(&shipment_id, update.verification_code())
                .await?;
        }

        let previous = shipment.status();
        let updated = self
            .shipments
            .apply_change(&shipment_id, change)
            .await
            .map_err(map_repository_error)?;

        if updated.status() != previous {
            info!(
                %shipment_id,
                from = %previous,
                to = %updated.status(),
                "shipment status changed"
            );
            if let Some(seller) = self.recipient(AccountRole::Seller, updated.seller_id()).await {
                self.notify(
                    &seller,
                    NotificationTemplate::ShipmentStatusChanged,
                    "shipment update".to_owned(),
                    json!({
                        "shipmentId": shipment_id.to_string(),
                        "status": updated.status().as_str(),
                    }),
                );
            }
        }

        Ok(updated)
    }

    async fn cancel(&self, request: SellerShipmentRequest) -> Result<Shipment, Error> {
        let SellerShipmentRequest {
            seller,
            shipment_id,
        } = request;
        require_role(seller, AccountRole::Seller, "cancel shipments")?;

        let shipment = load_shipment(self.shipments.as_ref(), &shipment_id).await?;
        if !shipment.is_owned_by(seller.id) {
            return Err(Error::unauthorized(NOT_AUTHORIZED));
        }

        let change =
            ShipmentChange::for_cancel(&shipment, self.clock.utc()).map_err(map_transition_error)?;
        let cancelled = self
            .shipments
            .apply_change(&shipment_id, change)
            .await
            .map_err(map_repository_error)?;

        info!(%shipment_id, "shipment cancelled");
        if let Some(partner) = self
            .recipient(AccountRole::Partner, cancelled.partner_id())
            .await
        {
            self.notify(
                &partner,
                NotificationTemplate::ShipmentCancelled,
                "shipment cancelled".to_owned(),
                json!({ "shipmentId": shipment_id.to_string() }),
            );
        }

        Ok(cancelled)
    }

    async fn delete(&self, request: SellerShipmentRequest) -> Result<(), Error> {
        let SellerShipmentRequest {
            seller,
            shipment_id,
        } = request;
        require_role(seller, AccountRole::Seller, "delete shipments")?;

        let shipment = load_shipment(self.shipments.as_ref(), &shipment_id).await?;
        if !shipment.is_owned_by(seller.id) {
            return Err(Error::unauthorized(NOT_AUTHORIZED));
        }

        let removed = self
            .shipments
            .delete(&shipment_id)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(Error::not_found(format!("shipment {shipment_id} not found")));
        }
        info!(%shipment_id, "shipment deleted");
        Ok(())
    }
}

/// Shipment service implementing the query driving port.
#[derive(Clone)]
pub struct ShipmentQueryService<R> {
    shipments: Arc<R>,
}

impl<R> ShipmentQueryService<R> {
    /// Create a new query service with the shipment repository.
    pub fn new(shipments: Arc<R>) -> Self {
        Self { shipments }
    }
}

#[async_trait]
impl<R> ShipmentQuery for ShipmentQueryService<R>
where
    R: ShipmentRepository,
{
    async fn get(&self, viewer: Principal, shipment_id: ShipmentId) -> Result<Shipment, Error> {
        let shipment = load_shipment(self.shipments.as_ref(), &shipment_id).await?;
        if !shipment.is_visible_to(viewer) {
            return Err(Error::unauthorized(NOT_AUTHORIZED));
        }
        Ok(shipment)
    }
}

#[cfg(test)]
#[path = "shipment_service_tests.rs"]
mod tests;
