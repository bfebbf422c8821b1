//! Shared harness for HTTP integration tests.
//!
//! Builds the full `/api/v1` surface over the in-memory adapters, captures
//! outgoing notifications and drives time through a [`MutableClock`].

#![allow(dead_code, reason = "each test binary uses a different subset")]

pub mod embedded_postgres;

use std::sync::{Arc, Mutex};

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};

use shiptrack::Trace;
use shiptrack::domain::ports::{Notification, NotificationTemplate, Notifier};
use shiptrack::domain::{
    AccountCollaborators, AccountService, AccountServiceConfig, ShipmentCollaborators,
    ShipmentCommandService, ShipmentQueryService,
};
use shiptrack::inbound::http::configure_api;
use shiptrack::inbound::http::state::HttpState;
use shiptrack::outbound::cache::{MemoryTokenRevocationStore, MemoryVerificationCodeStore};
use shiptrack::outbound::memory::MemoryStore;
use shiptrack::outbound::security::{
    Argon2PasswordHasher, HmacSignedLinks, JwtAccessTokens, SigningKey,
};
use shiptrack::test_support::MutableClock;

pub const PUBLIC_BASE_URL: &str = "https://track.example.test";
pub const PASSWORD: &str = "s3cret-pass";

/// Lifetime of access tokens issued by the harness.
pub const ACCESS_TOKEN_TTL: Duration = Duration::hours(24);

/// Notifier that keeps every message for inspection.
#[derive(Default)]
pub struct Outbox(Mutex<Vec<Notification>>);

impl Outbox {
    pub fn all(&self) -> Vec<Notification> {
        self.0.lock().expect("outbox lock").clone()
    }

    /// Most recent message using `template` sent to `email`.
    pub fn last_to(&self, email: &str, template: NotificationTemplate) -> Notification {
        self.all()
            .into_iter()
            .rev()
            .find(|message| {
                message.template == template
                    && message
                        .recipients
                        .iter()
                        .any(|recipient| recipient.as_str() == email)
            })
            .unwrap_or_else(|| panic!("no {} message for {email}", template.as_str()))
    }

    /// Token carried by the link inside the latest `template` message.
    pub fn link_token(&self, email: &str, template: NotificationTemplate, key: &str) -> String {
        let message = self.last_to(email, template);
        let url = message.context[key].as_str().expect("link url");
        assert!(url.starts_with(PUBLIC_BASE_URL), "unexpected link {url}");
        url.split_once("token=").expect("token parameter").1.to_owned()
    }
}

impl Notifier for Outbox {
    fn dispatch(&self, notification: Notification) {
        self.0.lock().expect("outbox lock").push(notification);
    }
}

pub struct Harness {
    pub state: web::Data<HttpState>,
    pub outbox: Arc<Outbox>,
    pub clock: Arc<MutableClock>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(Outbox::default());
        let start = Utc
            .with_ymd_and_hms(2026, 5, 4, 9, 0, 0)
            .single()
            .expect("timestamp");
        let clock = Arc::new(MutableClock::new(start));
        let key = SigningKey::from_bytes(&[42; 32]);

        let accounts = Arc::new(AccountService::new(
            Arc::clone(&store),
            AccountCollaborators {
                hasher: Arc::new(Argon2PasswordHasher::new()),
                tokens: Arc::new(JwtAccessTokens::new(&key)),
                revocations: Arc::new(MemoryTokenRevocationStore::new()),
                links: Arc::new(HmacSignedLinks::new(&key)),
                notifier: outbox.clone(),
                clock: clock.clone(),
            },
            AccountServiceConfig {
                public_base_url: PUBLIC_BASE_URL.to_owned(),
                access_token_ttl: ACCESS_TOKEN_TTL,
            },
        ));
        let shipments = Arc::new(ShipmentCommandService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            ShipmentCollaborators {
                codes: Arc::new(MemoryVerificationCodeStore::new()),
                notifier: outbox.clone(),
                clock: clock.clone(),
            },
        ));
        let state = web::Data::new(HttpState {
            accounts: accounts.clone(),
            authenticator: accounts,
            shipments,
            shipments_query: Arc::new(ShipmentQueryService::new(store)),
        });
        Self {
            state,
            outbox,
            clock,
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api))
    }
}

/// Send a JSON request, optionally authenticated, returning status and body.
pub async fn send<S>(
    app: &S,
    request: actix_test::TestRequest,
    token: Option<&str>,
    body: Option<Value>,
) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = request;
    if let Some(token) = token {
        request = request.insert_header(("Authorization", format!("Bearer {token}")));
    }
    if let Some(body) = body {
        request = request.set_json(body);
    }
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status().as_u16();
    let bytes = actix_test::read_body(response).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

/// Sign up, verify and log in an account, returning its id and token.
pub async fn onboard<S>(
    app: &S,
    outbox: &Outbox,
    prefix: &str,
    signup: Value,
) -> (String, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let email = signup["email"].as_str().expect("email").to_owned();
    let (status, account) = send(
        app,
        actix_test::TestRequest::post().uri(&format!("/api/v1/{prefix}/signup")),
        None,
        Some(signup),
    )
    .await;
    assert_eq!(status, 201, "signup failed: {account}");

    let token = outbox.link_token(&email, NotificationTemplate::VerifyEmail, "verificationUrl");
    let (status, body) = send(
        app,
        actix_test::TestRequest::get().uri(&format!("/api/v1/{prefix}/verify?token={token}")),
        None,
        None,
    )
    .await;
    assert_eq!(status, 200, "verification failed: {body}");

    let (status, issued) = send(
        app,
        actix_test::TestRequest::post().uri(&format!("/api/v1/{prefix}/token")),
        None,
        Some(json!({"email": email, "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, 200, "login failed: {issued}");

    (
        account["id"].as_str().expect("id").to_owned(),
        issued["accessToken"].as_str().expect("token").to_owned(),
    )
}

pub fn seller(name: &str, email: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "password": PASSWORD,
        "address": "1 Dock Road",
        "zipCode": 11001
    })
}

pub fn partner(name: &str, email: &str, zip_codes: &[u32], capacity: u32) -> Value {
    json!({
        "name": name,
        "email": email,
        "password": PASSWORD,
        "serviceableZipCodes": zip_codes,
        "maxHandlingCapacity": capacity
    })
}
