//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{delivery_partners, sellers, shipment_events, shipments};

// ---------------------------------------------------------------------------
// Account models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sellers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SellerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub address: String,
    pub zip_code: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sellers)]
pub(crate) struct NewSellerRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub email_verified: bool,
    pub address: &'a str,
    pub zip_code: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = delivery_partners)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PartnerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub serviceable_zip_codes: Vec<i32>,
    pub max_handling_capacity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = delivery_partners)]
pub(crate) struct NewPartnerRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub email_verified: bool,
    pub serviceable_zip_codes: Vec<i32>,
    pub max_handling_capacity: i32,
    pub created_at: DateTime<Utc>,
}

/// Partial partner update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = delivery_partners)]
pub(crate) struct PartnerProfileChangeset {
    pub serviceable_zip_codes: Option<Vec<i32>>,
    pub max_handling_capacity: Option<i32>,
}

/// Columns read when matching partners to a destination.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = delivery_partners)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PartnerCandidateRow {
    pub id: Uuid,
    pub name: String,
    pub serviceable_zip_codes: Vec<i32>,
    pub max_handling_capacity: i32,
}

// ---------------------------------------------------------------------------
// Shipment models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shipments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShipmentRow {
    pub id: Uuid,
    pub content: String,
    pub weight: f64,
    pub destination: i32,
    pub status: String,
    pub estimated_delivery: DateTime<Utc>,
    pub seller_id: Uuid,
    pub partner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shipments)]
pub(crate) struct NewShipmentRow<'a> {
    pub id: Uuid,
    pub content: &'a str,
    pub weight: f64,
    pub destination: i32,
    pub status: &'a str,
    pub estimated_delivery: DateTime<Utc>,
    pub seller_id: Uuid,
    pub partner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = shipments)]
pub(crate) struct ShipmentStateChangeset<'a> {
    pub status: &'a str,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shipment_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShipmentEventRow {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub location: Option<i32>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shipment_events)]
pub(crate) struct NewShipmentEventRow<'a> {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub location: Option<i32>,
    pub status: Option<&'a str>,
    pub description: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}
