//! Tests for account HTTP handlers.

use super::*;
use crate::domain::{AccessClaims, AccountId, AccountRecord, PasswordHash, ZipCode};
use crate::inbound::http::test_utils::{StateMocks, bearer, claims_for};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::Duration;
use rstest::rstest;
use serde_json::{Value, json};

fn account(profile: AccountProfile) -> Account {
    Account::from(AccountRecord {
        id: AccountId::random(),
        name: "Ada".to_owned(),
        email: EmailAddress::parse("ada@example.com").expect("email"),
        password_hash: PasswordHash::new("$argon2id$stub"),
        email_verified: false,
        profile,
        created_at: Utc::now(),
    })
}

fn seller_profile() -> AccountProfile {
    AccountProfile::seller("1 Dock Road", ZipCode::new(11001).expect("zip")).expect("profile")
}

fn partner_profile() -> AccountProfile {
    AccountProfile::partner(
        vec![
            ZipCode::new(11002).expect("zip"),
            ZipCode::new(11001).expect("zip"),
        ],
        3,
    )
    .expect("profile")
}

fn test_app(
    mocks: StateMocks,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(mocks.into_state()).service(
        web::scope("/api/v1")
            .service(seller_signup)
            .service(partner_signup)
            .service(seller_login)
            .service(partner_login)
            .service(seller_logout)
            .service(partner_logout)
            .service(seller_verify)
            .service(partner_verify)
            .service(seller_forgot_password)
            .service(partner_forgot_password)
            .service(seller_reset_password)
            .service(partner_reset_password)
            .service(update_partner),
    )
}

#[actix_web::test]
async fn seller_signup_returns_created_account_without_secrets() {
    let mut mocks = StateMocks::default();
    mocks
        .accounts
        .expect_signup()
        .withf(|draft| draft.role() == AccountRole::Seller)
        .times(1)
        .returning(|_| Ok(account(seller_profile())));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/sellers/signup")
        .set_json(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "s3cret-pass",
            "address": "1 Dock Road",
            "zipCode": 11001
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["role"], "seller");
    assert_eq!(body["zipCode"], 11001);
    assert_eq!(body["emailVerified"], false);
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("serviceableZipCodes").is_none());
}

#[actix_web::test]
async fn partner_signup_reports_coverage() {
    let mut mocks = StateMocks::default();
    mocks
        .accounts
        .expect_signup()
        .withf(|draft| draft.role() == AccountRole::Partner)
        .times(1)
        .returning(|_| Ok(account(partner_profile())));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/partners/signup")
        .set_json(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "s3cret-pass",
            "serviceableZipCodes": [11002, 11001],
            "maxHandlingCapacity": 3
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["serviceableZipCodes"], json!([11001, 11002]));
    assert_eq!(body["maxHandlingCapacity"], 3);
}

#[rstest]
#[case(json!({"name": "", "email": "a@example.com", "password": "s3cret-pass", "address": "x", "zipCode": 1}), "name")]
#[case(json!({"name": "Ada", "email": "nope", "password": "s3cret-pass", "address": "x", "zipCode": 1}), "email")]
#[case(json!({"name": "Ada", "email": "a@example.com", "password": "short", "address": "x", "zipCode": 1}), "password")]
#[case(json!({"name": "Ada", "email": "a@example.com", "password": "s3cret-pass", "address": "x", "zipCode": 0}), "zipCode")]
#[actix_web::test]
async fn invalid_seller_signups_name_the_field(#[case] payload: Value, #[case] field: &str) {
    let mut mocks = StateMocks::default();
    mocks.accounts.expect_signup().never();
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/sellers/signup")
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn duplicate_signups_conflict() {
    let mut mocks = StateMocks::default();
    mocks
        .accounts
        .expect_signup()
        .returning(|_| Err(Error::conflict("email already registered")));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/partners/signup")
        .set_json(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "s3cret-pass",
            "serviceableZipCodes": [11001],
            "maxHandlingCapacity": 1
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[rstest]
#[case("/api/v1/sellers/token", AccountRole::Seller)]
#[case("/api/v1/partners/token", AccountRole::Partner)]
#[actix_web::test]
async fn login_issues_bearer_tokens_for_the_route_role(
    #[case] uri: &str,
    #[case] role: AccountRole,
) {
    let mut mocks = StateMocks::default();
    mocks
        .accounts
        .expect_login()
        .withf(move |requested, credentials| {
            *requested == role && credentials.email().as_str() == "ada@example.com"
        })
        .times(1)
        .returning(move |_, _| {
            let claims = AccessClaims::new(
                AccountId::random(),
                role,
                "Ada",
                Utc::now(),
                Duration::minutes(30),
            );
            Ok(IssuedToken {
                token: "signed.jwt.value".to_owned(),
                claims,
            })
        });
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri(uri)
        .set_json(json!({"email": "ada@example.com", "password": "s3cret-pass"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["accessToken"], "signed.jwt.value");
    assert_eq!(body["tokenType"], "bearer");
    assert!(body["expiresAt"].is_string());
}

#[actix_web::test]
async fn login_with_empty_password_is_rejected_before_the_service() {
    let mut mocks = StateMocks::default();
    mocks.accounts.expect_login().never();
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/sellers/token")
        .set_json(json!({"email": "ada@example.com", "password": ""}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn logout_revokes_the_presented_claims() {
    let id = AccountId::random();
    let mut mocks = StateMocks::default();
    mocks.authenticate_as(claims_for(id, AccountRole::Seller));
    mocks
        .accounts
        .expect_logout()
        .withf(move |claims| claims.subject == id)
        .times(1)
        .returning(|_| Ok(()));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/sellers/logout")
        .insert_header(bearer("token"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["detail"], "Successfully logged out");
}

#[actix_web::test]
async fn partner_logout_refuses_seller_tokens() {
    let mut mocks = StateMocks::default();
    mocks.authenticate_as(claims_for(AccountId::random(), AccountRole::Seller));
    mocks.accounts.expect_logout().never();
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/partners/logout")
        .insert_header(bearer("token"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn verify_passes_the_link_token_through() {
    let mut mocks = StateMocks::default();
    mocks
        .accounts
        .expect_verify_email()
        .withf(|role, token| *role == AccountRole::Partner && token == "abc.def")
        .times(1)
        .returning(|_, _| Ok(()));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/v1/partners/verify?token=abc.def")
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn forgot_password_acknowledges_the_request() {
    let mut mocks = StateMocks::default();
    mocks
        .accounts
        .expect_request_password_reset()
        .withf(|role, email| *role == AccountRole::Seller && email.as_str() == "who@example.com")
        .times(1)
        .returning(|_, _| Ok(()));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/sellers/forgot-password")
        .set_json(json!({"email": "who@example.com"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["detail"], "Check email for password reset link");
}

#[actix_web::test]
async fn reset_password_validates_the_new_password() {
    let mut mocks = StateMocks::default();
    mocks.accounts.expect_reset_password().never();
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/partners/reset-password?token=abc.def")
        .set_json(json!({"password": "x"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "password");
}

#[actix_web::test]
async fn reset_password_maps_expired_links() {
    let mut mocks = StateMocks::default();
    mocks
        .accounts
        .expect_reset_password()
        .withf(|role, token, _| *role == AccountRole::Seller && token == "abc.def")
        .returning(|_, _, _| Err(Error::invalid_request("link has expired")));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/sellers/reset-password?token=abc.def")
        .set_json(json!({"password": "n3w-s3cret-pass"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn partner_profile_updates_return_the_account() {
    let id = AccountId::random();
    let mut mocks = StateMocks::default();
    mocks.authenticate_as(claims_for(id, AccountRole::Partner));
    mocks
        .accounts
        .expect_update_partner_profile()
        .withf(move |partner, update| {
            partner.id == id
                && update.max_handling_capacity() == Some(3)
                && update.serviceable_zip_codes().is_none()
        })
        .times(1)
        .returning(|_, _| Ok(account(partner_profile())));
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::patch()
        .uri("/api/v1/partners/me")
        .insert_header(bearer("token"))
        .set_json(json!({"maxHandlingCapacity": 3}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["maxHandlingCapacity"], 3);
}

#[actix_web::test]
async fn empty_partner_profile_updates_are_rejected() {
    let mut mocks = StateMocks::default();
    mocks.authenticate_as(claims_for(AccountId::random(), AccountRole::Partner));
    mocks.accounts.expect_update_partner_profile().never();
    let app = actix_test::init_service(test_app(mocks)).await;

    let request = actix_test::TestRequest::patch()
        .uri("/api/v1/partners/me")
        .insert_header(bearer("token"))
        .set_json(json!({}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["message"], "no data provided to update");
}
