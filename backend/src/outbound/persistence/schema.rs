//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Seller accounts. `email` is unique.
    sellers (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        email_verified -> Bool,
        address -> Text,
        zip_code -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Delivery partner accounts with their coverage and capacity.
    delivery_partners (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        email_verified -> Bool,
        /// GIN-indexed for containment lookups during matching.
        serviceable_zip_codes -> Array<Int4>,
        max_handling_capacity -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    shipments (id) {
        id -> Uuid,
        content -> Text,
        /// Kilograms, constrained to `(0, 25]`.
        weight -> Float8,
        destination -> Int4,
        /// One of the five lifecycle states in snake_case.
        status -> Varchar,
        estimated_delivery -> Timestamptz,
        seller_id -> Uuid,
        partner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only shipment timeline; rows cascade with their shipment.
    shipment_events (id) {
        id -> Uuid,
        shipment_id -> Uuid,
        location -> Nullable<Int4>,
        status -> Nullable<Varchar>,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(shipment_events -> shipments (shipment_id));
diesel::joinable!(shipments -> sellers (seller_id));
diesel::joinable!(shipments -> delivery_partners (partner_id));

diesel::allow_tables_to_appear_in_same_query!(
    delivery_partners,
    sellers,
    shipment_events,
    shipments,
);
