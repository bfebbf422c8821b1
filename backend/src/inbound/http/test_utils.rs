//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::web;
use chrono::{Duration, Utc};

use crate::domain::ports::{
    MockAccountCommand, MockShipmentCommand, MockShipmentQuery, MockTokenAuthenticator,
};
use crate::domain::{AccessClaims, AccountId, AccountRole};

use super::state::HttpState;

/// Mocked driving ports, turned into [`HttpState`] once expectations are set.
#[derive(Default)]
pub struct StateMocks {
    pub accounts: MockAccountCommand,
    pub authenticator: MockTokenAuthenticator,
    pub shipments: MockShipmentCommand,
    pub shipments_query: MockShipmentQuery,
}

impl StateMocks {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            accounts: Arc::new(self.accounts),
            authenticator: Arc::new(self.authenticator),
            shipments: Arc::new(self.shipments),
            shipments_query: Arc::new(self.shipments_query),
        })
    }

    /// Accept any bearer token as `claims`.
    pub fn authenticate_as(&mut self, claims: AccessClaims) {
        self.authenticator
            .expect_authenticate()
            .returning(move |_| Ok(claims.clone()));
    }
}

pub fn claims_for(id: AccountId, role: AccountRole) -> AccessClaims {
    AccessClaims::new(id, role, "Test Account", Utc::now(), Duration::minutes(30))
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}
