//! In-process account and shipment repositories.
//!
//! Used when no database URL is configured and by the integration suite.
//! One async mutex guards every table, so placement and status changes are
//! as atomic here as they are in the PostgreSQL adapter.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, ShipmentRepository, ShipmentRepositoryError,
};
use crate::domain::{
    Account, AccountId, AccountProfile, AccountRecord, AccountRole, EmailAddress, NewShipment,
    PartnerCandidate, PartnerProfileUpdate, PasswordHash, Shipment, ShipmentChange, ShipmentId,
    find_partner_for,
};

#[derive(Debug, Default)]
struct Tables {
    sellers: BTreeMap<AccountId, Account>,
    partners: BTreeMap<AccountId, Account>,
    shipments: HashMap<ShipmentId, Shipment>,
}

impl Tables {
    fn accounts(&self, role: AccountRole) -> &BTreeMap<AccountId, Account> {
        match role {
            AccountRole::Seller => &self.sellers,
            AccountRole::Partner => &self.partners,
        }
    }

    fn accounts_mut(&mut self, role: AccountRole) -> &mut BTreeMap<AccountId, Account> {
        match role {
            AccountRole::Seller => &mut self.sellers,
            AccountRole::Partner => &mut self.partners,
        }
    }

    fn partner_candidates(&self) -> Vec<PartnerCandidate> {
        self.partners
            .values()
            .filter_map(|account| match account.profile() {
                AccountProfile::Partner {
                    serviceable_zip_codes,
                    max_handling_capacity,
                } => Some(PartnerCandidate {
                    id: account.id(),
                    name: account.name().to_owned(),
                    serviceable_zip_codes: serviceable_zip_codes.clone(),
                    max_handling_capacity: *max_handling_capacity,
                    assigned_shipments: self.assigned_to(account.id()),
                }),
                AccountProfile::Seller { .. } => None,
            })
            .collect()
    }

    fn assigned_to(&self, partner: AccountId) -> u32 {
        let count = self
            .shipments
            .values()
            .filter(|shipment| shipment.is_assigned_to(partner))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Shared in-memory store implementing both repository ports.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn with_password(account: &Account, password_hash: &PasswordHash) -> Account {
    Account::from(AccountRecord {
        id: account.id(),
        name: account.name().to_owned(),
        email: account.email().clone(),
        password_hash: password_hash.clone(),
        email_verified: account.email_verified(),
        profile: account.profile().clone(),
        created_at: account.created_at(),
    })
}

fn verified(account: &Account) -> Account {
    Account::from(AccountRecord {
        id: account.id(),
        name: account.name().to_owned(),
        email: account.email().clone(),
        password_hash: account.password_hash().clone(),
        email_verified: true,
        profile: account.profile().clone(),
        created_at: account.created_at(),
    })
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        let mut tables = self.tables.lock().await;
        let accounts = tables.accounts_mut(account.role());
        if accounts
            .values()
            .any(|existing| existing.email() == account.email())
        {
            return Err(AccountRepositoryError::duplicate_email(
                account.email().as_str(),
            ));
        }
        accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        role: AccountRole,
        id: &AccountId,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.accounts(role).get(id).cloned())
    }

    async fn find_by_email(
        &self,
        role: AccountRole,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts(role)
            .values()
            .find(|account| account.email() == email)
            .cloned())
    }

    async fn mark_email_verified(
        &self,
        role: AccountRole,
        id: &AccountId,
    ) -> Result<bool, AccountRepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(account) = tables.accounts_mut(role).get_mut(id) else {
            return Ok(false);
        };
        *account = verified(account);
        Ok(true)
    }

    async fn update_password_hash(
        &self,
        role: AccountRole,
        id: &AccountId,
        password_hash: &PasswordHash,
    ) -> Result<bool, AccountRepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(account) = tables.accounts_mut(role).get_mut(id) else {
            return Ok(false);
        };
        *account = with_password(account, password_hash);
        Ok(true)
    }

    async fn update_partner_profile(
        &self,
        id: &AccountId,
        update: &PartnerProfileUpdate,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(account) = tables.partners.get_mut(id) else {
            return Ok(None);
        };
        account.apply_partner_update(update);
        Ok(Some(account.clone()))
    }
}

#[async_trait]
impl ShipmentRepository for MemoryStore {
    async fn create_assigned(
        &self,
        shipment: NewShipment,
    ) -> Result<Shipment, ShipmentRepositoryError> {
        let mut tables = self.tables.lock().await;
        let candidates = tables.partner_candidates();
        let partner = find_partner_for(shipment.destination, &candidates).map_err(|error| {
            ShipmentRepositoryError::no_partner_available(error.destination.value())
        })?;
        let placed = shipment.into_shipment(partner.id, &partner.name);
        debug!(shipment_id = %placed.id(), partner_id = %partner.id, "shipment stored in memory");
        tables.shipments.insert(placed.id(), placed.clone());
        Ok(placed)
    }

    async fn find_by_id(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<Shipment>, ShipmentRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.shipments.get(shipment_id).cloned())
    }

    async fn apply_change(
        &self,
        shipment_id: &ShipmentId,
        change: ShipmentChange,
    ) -> Result<Shipment, ShipmentRepositoryError> {
        let mut tables = self.tables.lock().await;
        let shipment = tables
            .shipments
            .get_mut(shipment_id)
            .ok_or_else(|| ShipmentRepositoryError::not_found(shipment_id.to_string()))?;
        if !shipment.apply(change) {
            return Err(ShipmentRepositoryError::status_conflict(
                shipment_id.to_string(),
            ));
        }
        Ok(shipment.clone())
    }

    async fn delete(&self, shipment_id: &ShipmentId) -> Result<bool, ShipmentRepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.shipments.remove(shipment_id).is_some())
    }
}
