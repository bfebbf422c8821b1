//! Seller and delivery-partner account handlers.
//!
//! ```text
//! POST  /api/v1/{sellers|partners}/signup
//! POST  /api/v1/{sellers|partners}/token
//! POST  /api/v1/{sellers|partners}/logout
//! GET   /api/v1/{sellers|partners}/verify?token=...
//! POST  /api/v1/{sellers|partners}/forgot-password
//! POST  /api/v1/{sellers|partners}/reset-password?token=...
//! PATCH /api/v1/partners/me
//! ```
//!
//! Both roles share one flow; the route decides the role.

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Account, AccountProfile, AccountRole, EmailAddress, Error, IssuedToken, LoginCredentials,
    NewPassword, PartnerProfileUpdate, SignupDraft,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{PartnerAuth, SellerAuth};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_account_validation_error, map_login_validation_error, parse_zip_code,
    parse_zip_codes,
};

/// Seller signup body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerSignupRequest {
    /// Display name.
    pub name: String,
    /// Login address.
    pub email: String,
    /// Plaintext password, at least eight characters.
    pub password: String,
    /// Pickup street address.
    pub address: String,
    /// Pickup zip code.
    #[schema(example = 11001)]
    pub zip_code: i64,
}

impl TryFrom<SellerSignupRequest> for SignupDraft {
    type Error = Error;

    fn try_from(value: SellerSignupRequest) -> Result<Self, Self::Error> {
        let zip_code = parse_zip_code(value.zip_code, FieldName::new("zipCode"))?;
        let profile =
            AccountProfile::seller(&value.address, zip_code).map_err(map_account_validation_error)?;
        Self::new(&value.name, &value.email, &value.password, profile)
            .map_err(map_account_validation_error)
    }
}

/// Delivery partner signup body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSignupRequest {
    /// Display name.
    pub name: String,
    /// Login address.
    pub email: String,
    /// Plaintext password, at least eight characters.
    pub password: String,
    /// Zip codes the partner delivers to.
    #[schema(example = json!([11001, 11002]))]
    pub serviceable_zip_codes: Vec<i64>,
    /// Most shipments held at once.
    #[schema(example = 5)]
    pub max_handling_capacity: u32,
}

impl TryFrom<PartnerSignupRequest> for SignupDraft {
    type Error = Error;

    fn try_from(value: PartnerSignupRequest) -> Result<Self, Self::Error> {
        let zip_codes = parse_zip_codes(
            value.serviceable_zip_codes,
            FieldName::new("serviceableZipCodes"),
        )?;
        let profile = AccountProfile::partner(zip_codes, value.max_handling_capacity)
            .map_err(map_account_validation_error)?;
        Self::new(&value.name, &value.email, &value.password, profile)
            .map_err(map_account_validation_error)
    }
}

/// Public view of an account; never includes the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login address.
    pub email: String,
    /// `seller` or `partner`.
    #[schema(example = "seller")]
    pub role: String,
    /// Whether the verification link was followed.
    pub email_verified: bool,
    /// Seller pickup address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Seller pickup zip code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<u32>,
    /// Partner coverage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serviceable_zip_codes: Option<Vec<u32>>,
    /// Partner capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_handling_capacity: Option<u32>,
    /// Signup time.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        let mut response = Self {
            id: account.id().to_string(),
            name: account.name().to_owned(),
            email: account.email().as_str().to_owned(),
            role: account.role().as_str().to_owned(),
            email_verified: account.email_verified(),
            address: None,
            zip_code: None,
            serviceable_zip_codes: None,
            max_handling_capacity: None,
            created_at: account.created_at(),
        };
        match account.profile() {
            AccountProfile::Seller { address, zip_code } => {
                response.address = Some(address.clone());
                response.zip_code = Some(zip_code.value());
            }
            AccountProfile::Partner {
                serviceable_zip_codes,
                max_handling_capacity,
            } => {
                response.serviceable_zip_codes =
                    Some(serviceable_zip_codes.iter().map(|zip| zip.value()).collect());
                response.max_handling_capacity = Some(*max_handling_capacity);
            }
        }
        response
    }
}

/// Login body for `POST /{role}/token`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = Error;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password).map_err(map_login_validation_error)
    }
}

/// Issued bearer token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Bearer token for the `Authorization` header.
    pub access_token: String,
    /// Always `bearer`.
    #[schema(example = "bearer")]
    pub token_type: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            access_token: issued.token,
            token_type: "bearer".to_owned(),
            expires_at: issued.claims.expires_at,
        }
    }
}

/// `?token=` query carried by account links.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LinkTokenQuery {
    /// Signed link token.
    pub token: String,
}

/// Body for `POST /{role}/forgot-password`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    /// Address to send the reset link to.
    pub email: String,
}

/// Body for `POST /{role}/reset-password`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// New plaintext password.
    pub password: String,
}

/// Partial partner profile update; at least one field is required.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerUpdateRequest {
    /// Replacement coverage.
    #[serde(default)]
    pub serviceable_zip_codes: Option<Vec<i64>>,
    /// Replacement capacity.
    #[serde(default)]
    pub max_handling_capacity: Option<u32>,
}

impl TryFrom<PartnerUpdateRequest> for PartnerProfileUpdate {
    type Error = Error;

    fn try_from(value: PartnerUpdateRequest) -> Result<Self, Self::Error> {
        let zip_codes = value
            .serviceable_zip_codes
            .map(|codes| parse_zip_codes(codes, FieldName::new("serviceableZipCodes")))
            .transpose()?;
        Self::new(zip_codes, value.max_handling_capacity).map_err(map_account_validation_error)
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub detail: String,
}

impl MessageResponse {
    fn new(detail: &str) -> web::Json<Self> {
        web::Json(Self {
            detail: detail.to_owned(),
        })
    }
}

async fn signup(state: &HttpState, draft: SignupDraft) -> ApiResult<HttpResponse> {
    let account = state.accounts.signup(draft).await?;
    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

async fn login(
    state: &HttpState,
    role: AccountRole,
    payload: LoginRequest,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials = LoginCredentials::try_from(payload)?;
    let issued = state.accounts.login(role, credentials).await?;
    Ok(web::Json(issued.into()))
}

async fn verify(
    state: &HttpState,
    role: AccountRole,
    query: LinkTokenQuery,
) -> ApiResult<web::Json<MessageResponse>> {
    state.accounts.verify_email(role, query.token).await?;
    Ok(MessageResponse::new("Account verified."))
}

async fn forgot_password(
    state: &HttpState,
    role: AccountRole,
    payload: ForgotPasswordRequest,
) -> ApiResult<web::Json<MessageResponse>> {
    let email = EmailAddress::parse(&payload.email).map_err(map_account_validation_error)?;
    state.accounts.request_password_reset(role, email).await?;
    Ok(MessageResponse::new("Check email for password reset link"))
}

async fn reset_password(
    state: &HttpState,
    role: AccountRole,
    query: LinkTokenQuery,
    payload: ResetPasswordRequest,
) -> ApiResult<web::Json<MessageResponse>> {
    let password = NewPassword::new(&payload.password).map_err(map_account_validation_error)?;
    state
        .accounts
        .reset_password(role, query.token, password)
        .await?;
    Ok(MessageResponse::new("Password updated."))
}

/// Register a seller account and mail its verification link.
#[utoipa::path(
    post,
    path = "/api/v1/sellers/signup",
    request_body = SellerSignupRequest,
    responses(
        (status = 201, description = "Seller registered", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
    ),
    tags = ["sellers"],
    operation_id = "sellerSignup",
    security([])
)]
#[post("/sellers/signup")]
pub async fn seller_signup(
    state: web::Data<HttpState>,
    payload: web::Json<SellerSignupRequest>,
) -> ApiResult<HttpResponse> {
    let draft = SignupDraft::try_from(payload.into_inner())?;
    signup(&state, draft).await
}

/// Register a delivery partner account and mail its verification link.
#[utoipa::path(
    post,
    path = "/api/v1/partners/signup",
    request_body = PartnerSignupRequest,
    responses(
        (status = 201, description = "Partner registered", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
    ),
    tags = ["partners"],
    operation_id = "partnerSignup",
    security([])
)]
#[post("/partners/signup")]
pub async fn partner_signup(
    state: web::Data<HttpState>,
    payload: web::Json<PartnerSignupRequest>,
) -> ApiResult<HttpResponse> {
    let draft = SignupDraft::try_from(payload.into_inner())?;
    signup(&state, draft).await
}

/// Exchange seller credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/sellers/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorSchema),
        (status = 401, description = "Email not verified", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema),
    ),
    tags = ["sellers"],
    operation_id = "sellerLogin",
    security([])
)]
#[post("/sellers/token")]
pub async fn seller_login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    login(&state, AccountRole::Seller, payload.into_inner()).await
}

/// Exchange partner credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/partners/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorSchema),
        (status = 401, description = "Email not verified", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema),
    ),
    tags = ["partners"],
    operation_id = "partnerLogin",
    security([])
)]
#[post("/partners/token")]
pub async fn partner_login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    login(&state, AccountRole::Partner, payload.into_inner()).await
}

/// Revoke the presented seller token.
#[utoipa::path(
    post,
    path = "/api/v1/sellers/logout",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
    ),
    tags = ["sellers"],
    operation_id = "sellerLogout"
)]
#[post("/sellers/logout")]
pub async fn seller_logout(
    state: web::Data<HttpState>,
    seller: SellerAuth,
) -> ApiResult<web::Json<MessageResponse>> {
    state.accounts.logout(seller.into_claims()).await?;
    Ok(MessageResponse::new("Successfully logged out"))
}

/// Revoke the presented partner token.
#[utoipa::path(
    post,
    path = "/api/v1/partners/logout",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
    ),
    tags = ["partners"],
    operation_id = "partnerLogout"
)]
#[post("/partners/logout")]
pub async fn partner_logout(
    state: web::Data<HttpState>,
    partner: PartnerAuth,
) -> ApiResult<web::Json<MessageResponse>> {
    state.accounts.logout(partner.into_claims()).await?;
    Ok(MessageResponse::new("Successfully logged out"))
}

/// Confirm a seller email address from a verification link.
#[utoipa::path(
    get,
    path = "/api/v1/sellers/verify",
    params(LinkTokenQuery),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired link", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema),
    ),
    tags = ["sellers"],
    operation_id = "sellerVerifyEmail",
    security([])
)]
#[get("/sellers/verify")]
pub async fn seller_verify(
    state: web::Data<HttpState>,
    query: web::Query<LinkTokenQuery>,
) -> ApiResult<web::Json<MessageResponse>> {
    verify(&state, AccountRole::Seller, query.into_inner()).await
}

/// Confirm a partner email address from a verification link.
#[utoipa::path(
    get,
    path = "/api/v1/partners/verify",
    params(LinkTokenQuery),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired link", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema),
    ),
    tags = ["partners"],
    operation_id = "partnerVerifyEmail",
    security([])
)]
#[get("/partners/verify")]
pub async fn partner_verify(
    state: web::Data<HttpState>,
    query: web::Query<LinkTokenQuery>,
) -> ApiResult<web::Json<MessageResponse>> {
    verify(&state, AccountRole::Partner, query.into_inner()).await
}

/// Mail a seller password reset link; unknown addresses succeed silently.
#[utoipa::path(
    post,
    path = "/api/v1/sellers/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorSchema),
    ),
    tags = ["sellers"],
    operation_id = "sellerForgotPassword",
    security([])
)]
#[post("/sellers/forgot-password")]
pub async fn seller_forgot_password(
    state: web::Data<HttpState>,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    forgot_password(&state, AccountRole::Seller, payload.into_inner()).await
}

/// Mail a partner password reset link; unknown addresses succeed silently.
#[utoipa::path(
    post,
    path = "/api/v1/partners/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorSchema),
    ),
    tags = ["partners"],
    operation_id = "partnerForgotPassword",
    security([])
)]
#[post("/partners/forgot-password")]
pub async fn partner_forgot_password(
    state: web::Data<HttpState>,
    payload: web::Json<ForgotPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    forgot_password(&state, AccountRole::Partner, payload.into_inner()).await
}

/// Set a new seller password from a reset link.
#[utoipa::path(
    post,
    path = "/api/v1/sellers/reset-password",
    params(LinkTokenQuery),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid link or password", body = ErrorSchema),
    ),
    tags = ["sellers"],
    operation_id = "sellerResetPassword",
    security([])
)]
#[post("/sellers/reset-password")]
pub async fn seller_reset_password(
    state: web::Data<HttpState>,
    query: web::Query<LinkTokenQuery>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    reset_password(
        &state,
        AccountRole::Seller,
        query.into_inner(),
        payload.into_inner(),
    )
    .await
}

/// Set a new partner password from a reset link.
#[utoipa::path(
    post,
    path = "/api/v1/partners/reset-password",
    params(LinkTokenQuery),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid link or password", body = ErrorSchema),
    ),
    tags = ["partners"],
    operation_id = "partnerResetPassword",
    security([])
)]
#[post("/partners/reset-password")]
pub async fn partner_reset_password(
    state: web::Data<HttpState>,
    query: web::Query<LinkTokenQuery>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    reset_password(
        &state,
        AccountRole::Partner,
        query.into_inner(),
        payload.into_inner(),
    )
    .await
}

/// Update the calling partner's coverage or capacity.
#[utoipa::path(
    patch,
    path = "/api/v1/partners/me",
    request_body = PartnerUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "No data provided or invalid values", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not a partner", body = ErrorSchema),
    ),
    tags = ["partners"],
    operation_id = "updatePartnerProfile"
)]
#[patch("/partners/me")]
pub async fn update_partner(
    state: web::Data<HttpState>,
    partner: PartnerAuth,
    payload: web::Json<PartnerUpdateRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let update = PartnerProfileUpdate::try_from(payload.into_inner())?;
    let account = state
        .accounts
        .update_partner_profile(partner.principal(), update)
        .await?;
    Ok(web::Json(account.into()))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
