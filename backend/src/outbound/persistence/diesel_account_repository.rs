//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! Sellers and delivery partners live in separate tables, so every lookup
//! dispatches on [`AccountRole`]. Email uniqueness is enforced by a unique
//! index per table and surfaces as `DuplicateEmail`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{AccountRepository, AccountRepositoryError};
use crate::domain::{
    Account, AccountId, AccountProfile, AccountRecord, AccountRole, EmailAddress,
    PartnerProfileUpdate, PasswordHash, ZipCode,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    NewPartnerRow, NewSellerRow, PartnerProfileChangeset, PartnerRow, SellerRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{delivery_partners, sellers};

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountRepositoryError {
    map_basic_pool_error(error, AccountRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AccountRepositoryError {
    map_basic_diesel_error(
        error,
        AccountRepositoryError::query,
        AccountRepositoryError::connection,
    )
}

fn map_insert_error(error: diesel::result::Error, email: &EmailAddress) -> AccountRepositoryError {
    if is_unique_violation(&error) {
        return AccountRepositoryError::duplicate_email(email.as_str());
    }
    map_diesel_error(error)
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "zip codes are bounded to six digits"
)]
pub(super) fn zip_to_db(zip_code: ZipCode) -> i32 {
    zip_code.value() as i32
}

fn capacity_to_db(capacity: u32) -> i32 {
    i32::try_from(capacity).unwrap_or(i32::MAX)
}

fn zip_from_db(raw: i32, row_id: Uuid) -> Result<ZipCode, AccountRepositoryError> {
    ZipCode::new(i64::from(raw)).map_err(|error| {
        warn!(%row_id, value = raw, "stored zip code out of range");
        AccountRepositoryError::query(error.to_string())
    })
}

fn email_from_db(raw: &str, row_id: Uuid) -> Result<EmailAddress, AccountRepositoryError> {
    EmailAddress::parse(raw).map_err(|error| {
        warn!(%row_id, "stored email address is malformed");
        AccountRepositoryError::query(error.to_string())
    })
}

fn seller_from_row(row: SellerRow) -> Result<Account, AccountRepositoryError> {
    let email = email_from_db(&row.email, row.id)?;
    let zip_code = zip_from_db(row.zip_code, row.id)?;
    Ok(Account::from(AccountRecord {
        id: AccountId::from_uuid(row.id),
        name: row.name,
        email,
        password_hash: PasswordHash::new(row.password_hash),
        email_verified: row.email_verified,
        profile: AccountProfile::Seller {
            address: row.address,
            zip_code,
        },
        created_at: row.created_at,
    }))
}

fn partner_from_row(row: PartnerRow) -> Result<Account, AccountRepositoryError> {
    let email = email_from_db(&row.email, row.id)?;
    let serviceable_zip_codes = row
        .serviceable_zip_codes
        .iter()
        .map(|raw| zip_from_db(*raw, row.id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Account::from(AccountRecord {
        id: AccountId::from_uuid(row.id),
        name: row.name,
        email,
        password_hash: PasswordHash::new(row.password_hash),
        email_verified: row.email_verified,
        profile: AccountProfile::Partner {
            serviceable_zip_codes,
            max_handling_capacity: u32::try_from(row.max_handling_capacity).unwrap_or(0),
        },
        created_at: row.created_at,
    }))
}

fn partner_changeset(update: &PartnerProfileUpdate) -> PartnerProfileChangeset {
    PartnerProfileChangeset {
        serviceable_zip_codes: update
            .serviceable_zip_codes()
            .map(|zip_codes| zip_codes.iter().copied().map(zip_to_db).collect()),
        max_handling_capacity: update.max_handling_capacity().map(capacity_to_db),
    }
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn insert(&self, account: &Account) -> Result<(), AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = match account.profile() {
            AccountProfile::Seller { address, zip_code } => {
                let row = NewSellerRow {
                    id: *account.id().as_uuid(),
                    name: account.name(),
                    email: account.email().as_str(),
                    password_hash: account.password_hash().as_str(),
                    email_verified: account.email_verified(),
                    address,
                    zip_code: zip_to_db(*zip_code),
                    created_at: account.created_at(),
                };
                diesel::insert_into(sellers::table)
                    .values(&row)
                    .execute(&mut conn)
                    .await
            }
            AccountProfile::Partner {
                serviceable_zip_codes,
                max_handling_capacity,
            } => {
                let row = NewPartnerRow {
                    id: *account.id().as_uuid(),
                    name: account.name(),
                    email: account.email().as_str(),
                    password_hash: account.password_hash().as_str(),
                    email_verified: account.email_verified(),
                    serviceable_zip_codes: serviceable_zip_codes
                        .iter()
                        .copied()
                        .map(zip_to_db)
                        .collect(),
                    max_handling_capacity: capacity_to_db(*max_handling_capacity),
                    created_at: account.created_at(),
                };
                diesel::insert_into(delivery_partners::table)
                    .values(&row)
                    .execute(&mut conn)
                    .await
            }
        };

        inserted
            .map(|_| ())
            .map_err(|error| map_insert_error(error, account.email()))
    }

    async fn find_by_id(
        &self,
        role: AccountRole,
        id: &AccountId,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        match role {
            AccountRole::Seller => sellers::table
                .find(id.as_uuid())
                .select(SellerRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .map(seller_from_row)
                .transpose(),
            AccountRole::Partner => delivery_partners::table
                .find(id.as_uuid())
                .select(PartnerRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .map(partner_from_row)
                .transpose(),
        }
    }

    async fn find_by_email(
        &self,
        role: AccountRole,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        match role {
            AccountRole::Seller => sellers::table
                .filter(sellers::email.eq(email.as_str()))
                .select(SellerRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .map(seller_from_row)
                .transpose(),
            AccountRole::Partner => delivery_partners::table
                .filter(delivery_partners::email.eq(email.as_str()))
                .select(PartnerRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .map(partner_from_row)
                .transpose(),
        }
    }

    async fn mark_email_verified(
        &self,
        role: AccountRole,
        id: &AccountId,
    ) -> Result<bool, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = match role {
            AccountRole::Seller => {
                diesel::update(sellers::table.find(id.as_uuid()))
                    .set(sellers::email_verified.eq(true))
                    .execute(&mut conn)
                    .await
            }
            AccountRole::Partner => {
                diesel::update(delivery_partners::table.find(id.as_uuid()))
                    .set(delivery_partners::email_verified.eq(true))
                    .execute(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn update_password_hash(
        &self,
        role: AccountRole,
        id: &AccountId,
        password_hash: &PasswordHash,
    ) -> Result<bool, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = match role {
            AccountRole::Seller => {
                diesel::update(sellers::table.find(id.as_uuid()))
                    .set(sellers::password_hash.eq(password_hash.as_str()))
                    .execute(&mut conn)
                    .await
            }
            AccountRole::Partner => {
                diesel::update(delivery_partners::table.find(id.as_uuid()))
                    .set(delivery_partners::password_hash.eq(password_hash.as_str()))
                    .execute(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn update_partner_profile(
        &self,
        id: &AccountId,
        update: &PartnerProfileUpdate,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PartnerRow> = diesel::update(delivery_partners::table.find(id.as_uuid()))
            .set(&partner_changeset(update))
            .returning(PartnerRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(partner_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    //! Row mapping and error translation coverage; database round trips live
    //! in the integration suite.
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn seller_row() -> SellerRow {
        SellerRow {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            email_verified: true,
            address: "1 Dock Road".to_owned(),
            zip_code: 10_001,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(error, AccountRepositoryError::Connection { .. }));
        assert!(error.to_string().contains("connection refused"));
    }

    #[rstest]
    fn non_unique_insert_failures_are_query_errors() {
        let email = EmailAddress::parse("ada@example.com").expect("valid email");
        let error = map_insert_error(diesel::result::Error::NotFound, &email);

        assert!(matches!(error, AccountRepositoryError::Query { .. }));
    }

    #[rstest]
    fn seller_rows_become_seller_accounts() {
        let row = seller_row();
        let id = row.id;
        let account = seller_from_row(row).expect("valid row");

        assert_eq!(account.id(), AccountId::from_uuid(id));
        assert_eq!(account.role(), AccountRole::Seller);
        assert_eq!(account.seller_zip_code().map(ZipCode::value), Some(10_001));
    }

    #[rstest]
    fn corrupt_zip_codes_surface_as_query_errors() {
        let mut row = seller_row();
        row.zip_code = 0;

        let error = seller_from_row(row).expect_err("zip 0 is out of range");
        assert!(matches!(error, AccountRepositoryError::Query { .. }));
    }

    #[rstest]
    fn partner_changeset_skips_absent_fields() {
        let update = PartnerProfileUpdate::new(None, Some(7)).expect("valid update");
        let changeset = partner_changeset(&update);

        assert_eq!(changeset.serviceable_zip_codes, None);
        assert_eq!(changeset.max_handling_capacity, Some(7));
    }
}
