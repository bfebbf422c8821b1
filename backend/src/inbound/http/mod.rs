//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers translate JSON bodies into validated domain drafts, resolve the
//! caller from the bearer token and delegate to the driving ports held in
//! [`state::HttpState`].

pub mod accounts;
pub mod auth;
pub mod error;
pub mod health;
pub mod schemas;
pub mod shipments;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::seller_signup)
        .service(accounts::seller_login)
        .service(accounts::seller_logout)
        .service(accounts::seller_verify)
        .service(accounts::seller_forgot_password)
        .service(accounts::seller_reset_password)
        .service(accounts::partner_signup)
        .service(accounts::partner_login)
        .service(accounts::partner_logout)
        .service(accounts::partner_verify)
        .service(accounts::partner_forgot_password)
        .service(accounts::partner_reset_password)
        .service(accounts::update_partner)
        .service(shipments::create_shipment)
        .service(shipments::get_shipment)
        .service(shipments::update_shipment)
        .service(shipments::cancel_shipment)
        .service(shipments::delete_shipment);
}
