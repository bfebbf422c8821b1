//! Bearer token extractors.
//!
//! Handlers take [`Authenticated`], [`SellerAuth`] or [`PartnerAuth`] as
//! arguments; the extractor reads `Authorization: Bearer <token>`, resolves
//! it through the [`TokenAuthenticator`](crate::domain::ports::TokenAuthenticator)
//! port and enforces the account role.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{AccessClaims, AccountRole, Error, Principal};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the raw token out of the `Authorization` header.
fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("invalid authorization header"))?;
    let token = value
        .get(..BEARER_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX))
        .and_then(|_| value.get(BEARER_PREFIX.len()..))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    Ok(token.to_owned())
}

fn resolve(req: &HttpRequest) -> LocalBoxFuture<'static, Result<AccessClaims, Error>> {
    let state = req.app_data::<web::Data<HttpState>>().cloned();
    let token = bearer_token(req);
    Box::pin(async move {
        let state = state.ok_or_else(|| Error::internal("HTTP state not configured"))?;
        state.authenticator.authenticate(&token?).await
    })
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AccessClaims);

impl Authenticated {
    /// Caller identity for services.
    pub fn principal(&self) -> Principal {
        self.0.principal()
    }

    /// Unwrap the verified claims.
    pub fn into_claims(self) -> AccessClaims {
        self.0
    }
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = resolve(req);
        Box::pin(async move { claims.await.map(Self) })
    }
}

fn require_role(claims: AccessClaims, role: AccountRole) -> Result<AccessClaims, Error> {
    if claims.role == role {
        Ok(claims)
    } else {
        Err(Error::forbidden(format!(
            "this endpoint requires a {role} account"
        )))
    }
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub AccessClaims);

        impl $name {
            /// Caller identity for services.
            pub fn principal(&self) -> Principal {
                self.0.principal()
            }

            /// Unwrap the verified claims.
            pub fn into_claims(self) -> AccessClaims {
                self.0
            }
        }

        impl FromRequest for $name {
            type Error = Error;
            type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                let claims = resolve(req);
                Box::pin(async move { require_role(claims.await?, $role).map(Self) })
            }
        }
    };
}

role_extractor!(
    /// Authenticated seller.
    SellerAuth,
    AccountRole::Seller
);
role_extractor!(
    /// Authenticated delivery partner.
    PartnerAuth,
    AccountRole::Partner
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, ErrorCode};
    use crate::inbound::http::test_utils::{StateMocks, bearer, claims_for};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    #[rstest]
    #[case(None, "missing bearer token")]
    #[case(Some("Basic abc"), "missing bearer token")]
    #[case(Some("Bearer "), "missing bearer token")]
    fn malformed_headers_are_unauthorized(#[case] header: Option<&str>, #[case] message: &str) {
        let mut request = actix_test::TestRequest::get();
        if let Some(value) = header {
            request = request.insert_header((AUTHORIZATION, value));
        }

        let error = bearer_token(&request.to_http_request()).expect_err("rejected");

        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.message(), message);
    }

    #[rstest]
    #[case("Bearer abc.def")]
    #[case("bearer abc.def")]
    fn bearer_scheme_is_case_insensitive(#[case] header: &str) {
        let request = actix_test::TestRequest::get()
            .insert_header((AUTHORIZATION, header))
            .to_http_request();
        assert_eq!(bearer_token(&request).expect("token"), "abc.def");
    }

    #[rstest]
    #[case(AccountRole::Seller, StatusCode::OK)]
    #[case(AccountRole::Partner, StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn seller_extractor_enforces_role(#[case] role: AccountRole, #[case] expected: StatusCode) {
        let claims = claims_for(AccountId::random(), role);
        let mut mocks = StateMocks::default();
        mocks
            .authenticator
            .expect_authenticate()
            .returning(move |_| Ok(claims.clone()));
        let app = actix_test::init_service(App::new().app_data(mocks.into_state()).route(
            "/",
            web::get().to(|seller: SellerAuth| async move {
                HttpResponse::Ok().body(seller.principal().id.to_string())
            }),
        ))
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/")
                .insert_header(bearer("token"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn authenticator_errors_pass_through() {
        let mut mocks = StateMocks::default();
        mocks
            .authenticator
            .expect_authenticate()
            .withf(|token| token == "stale")
            .returning(|_| Err(Error::unauthorized("access token revoked")));
        let app = actix_test::init_service(App::new().app_data(mocks.into_state()).route(
            "/",
            web::get().to(|_: PartnerAuth| async { HttpResponse::Ok().finish() }),
        ))
        .await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/")
                .insert_header(bearer("stale"))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Error = actix_test::read_body_json(res).await;
        assert_eq!(body.message(), "access token revoked");
    }
}
