//! Shipment lifecycle handlers.
//!
//! ```text
//! POST   /api/v1/shipments              seller places a shipment
//! GET    /api/v1/shipments/{id}         owning seller or assigned partner
//! PATCH  /api/v1/shipments/{id}         assigned partner advances it
//! POST   /api/v1/shipments/{id}/cancel  owning seller cancels it
//! DELETE /api/v1/shipments/{id}         owning seller removes it
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreateShipmentRequest, SellerShipmentRequest, UpdateShipmentRequest};
use crate::domain::{Error, Shipment, ShipmentDraft, ShipmentEvent, ShipmentId, ShipmentUpdate};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{Authenticated, PartnerAuth, SellerAuth};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, map_shipment_validation_error, parse_optional_rfc3339_timestamp,
    parse_optional_status, parse_uuid, parse_zip_code,
};

/// Body for `POST /shipments`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentBody {
    /// What is being shipped.
    #[schema(example = "Books")]
    pub content: String,
    /// Kilograms, greater than zero and at most 25.
    #[schema(example = 2.5)]
    pub weight: f64,
    /// Delivery zip code.
    #[schema(example = 11002)]
    pub destination: i64,
}

impl TryFrom<CreateShipmentBody> for ShipmentDraft {
    type Error = Error;

    fn try_from(value: CreateShipmentBody) -> Result<Self, Self::Error> {
        let destination = parse_zip_code(value.destination, FieldName::new("destination"))?;
        Self::new(&value.content, value.weight, destination).map_err(map_shipment_validation_error)
    }
}

/// Body for `PATCH /shipments/{id}`. At least one of `location`, `status`,
/// `estimatedDelivery` or `description` must be present.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShipmentBody {
    /// Zip code where the parcel was seen.
    #[serde(default)]
    pub location: Option<i64>,
    /// Target status.
    #[serde(default)]
    #[schema(example = "in_transit")]
    pub status: Option<String>,
    /// Revised estimate, RFC 3339.
    #[serde(default)]
    #[schema(format = DateTime)]
    pub estimated_delivery: Option<String>,
    /// Free-form note for the timeline.
    #[serde(default)]
    pub description: Option<String>,
    /// Required when the status moves to `delivered`.
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl TryFrom<UpdateShipmentBody> for ShipmentUpdate {
    type Error = Error;

    fn try_from(value: UpdateShipmentBody) -> Result<Self, Self::Error> {
        let location = value
            .location
            .map(|zip| parse_zip_code(zip, FieldName::new("location")))
            .transpose()?;
        let status = parse_optional_status(value.status, FieldName::new("status"))?;
        let estimated_delivery = parse_optional_rfc3339_timestamp(
            value.estimated_delivery,
            FieldName::new("estimatedDelivery"),
        )?;
        Self::new(
            location,
            status,
            estimated_delivery,
            value.description,
            value.verification_code,
        )
        .map_err(map_shipment_validation_error)
    }
}

/// One timeline entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    /// Event identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    /// Reported zip code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<u32>,
    /// Status reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-form note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<&ShipmentEvent> for EventResponse {
    fn from(event: &ShipmentEvent) -> Self {
        Self {
            id: event.id().as_uuid().to_string(),
            location: event.location().map(|zip| zip.value()),
            status: event.status().map(|status| status.as_str().to_owned()),
            description: event.description().map(str::to_owned),
            created_at: event.created_at(),
        }
    }
}

/// Shipment with its timeline, most recent event first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentResponse {
    /// Shipment identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    /// What is being shipped.
    pub content: String,
    /// Kilograms.
    pub weight: f64,
    /// Delivery zip code.
    pub destination: u32,
    /// Current status.
    #[schema(example = "placed")]
    pub status: String,
    /// Current delivery estimate.
    pub estimated_delivery: DateTime<Utc>,
    /// Owning seller.
    #[schema(value_type = String, format = Uuid)]
    pub seller_id: String,
    /// Assigned partner.
    #[schema(value_type = String, format = Uuid)]
    pub partner_id: String,
    /// Placement time.
    pub created_at: DateTime<Utc>,
    /// Events, newest first.
    pub timeline: Vec<EventResponse>,
}

impl From<Shipment> for ShipmentResponse {
    fn from(shipment: Shipment) -> Self {
        Self {
            id: shipment.id().to_string(),
            content: shipment.content().to_owned(),
            weight: shipment.weight().value(),
            destination: shipment.destination().value(),
            status: shipment.status().as_str().to_owned(),
            estimated_delivery: shipment.estimated_delivery(),
            seller_id: shipment.seller_id().to_string(),
            partner_id: shipment.partner_id().to_string(),
            created_at: shipment.created_at(),
            timeline: shipment
                .timeline()
                .newest_first()
                .map(EventResponse::from)
                .collect(),
        }
    }
}

fn shipment_id(raw: &str) -> Result<ShipmentId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(ShipmentId::from_uuid)
}

/// Place a shipment and assign it to the first partner with spare capacity.
#[utoipa::path(
    post,
    path = "/api/v1/shipments",
    request_body = CreateShipmentBody,
    responses(
        (status = 201, description = "Shipment placed", body = ShipmentResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not a seller", body = ErrorSchema),
        (status = 406, description = "No delivery partner available", body = ErrorSchema),
        (status = 503, description = "Verification code store unavailable", body = ErrorSchema),
    ),
    tags = ["shipments"],
    operation_id = "createShipment"
)]
#[post("/shipments")]
pub async fn create_shipment(
    state: web::Data<HttpState>,
    seller: SellerAuth,
    payload: web::Json<CreateShipmentBody>,
) -> ApiResult<HttpResponse> {
    let draft = ShipmentDraft::try_from(payload.into_inner())?;
    let shipment = state
        .shipments
        .create(CreateShipmentRequest {
            seller: seller.principal(),
            draft,
        })
        .await?;
    Ok(HttpResponse::Created().json(ShipmentResponse::from(shipment)))
}

/// Fetch a shipment and its timeline.
#[utoipa::path(
    get,
    path = "/api/v1/shipments/{id}",
    params(("id" = String, Path, description = "Shipment identifier")),
    responses(
        (status = 200, description = "Shipment", body = ShipmentResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Not the owner or assignee", body = ErrorSchema),
        (status = 404, description = "Unknown shipment", body = ErrorSchema),
    ),
    tags = ["shipments"],
    operation_id = "getShipment"
)]
#[get("/shipments/{id}")]
pub async fn get_shipment(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<ShipmentResponse>> {
    let id = shipment_id(&path.into_inner())?;
    let shipment = state.shipments_query.get(caller.principal(), id).await?;
    Ok(web::Json(shipment.into()))
}

/// Record progress on an assigned shipment.
#[utoipa::path(
    patch,
    path = "/api/v1/shipments/{id}",
    params(("id" = String, Path, description = "Shipment identifier")),
    request_body = UpdateShipmentBody,
    responses(
        (status = 200, description = "Shipment updated", body = ShipmentResponse),
        (status = 400, description = "No data or invalid transition", body = ErrorSchema),
        (status = 401, description = "Not the assigned partner or wrong verification code", body = ErrorSchema),
        (status = 403, description = "Not a partner", body = ErrorSchema),
        (status = 404, description = "Unknown shipment", body = ErrorSchema),
        (status = 409, description = "Shipment already delivered or cancelled", body = ErrorSchema),
    ),
    tags = ["shipments"],
    operation_id = "updateShipment"
)]
#[patch("/shipments/{id}")]
pub async fn update_shipment(
    state: web::Data<HttpState>,
    partner: PartnerAuth,
    path: web::Path<String>,
    payload: web::Json<UpdateShipmentBody>,
) -> ApiResult<web::Json<ShipmentResponse>> {
    let id = shipment_id(&path.into_inner())?;
    let update = ShipmentUpdate::try_from(payload.into_inner())?;
    let shipment = state
        .shipments
        .update(UpdateShipmentRequest {
            partner: partner.principal(),
            shipment_id: id,
            update,
        })
        .await?;
    Ok(web::Json(shipment.into()))
}

/// Cancel a shipment that has not reached a terminal state.
#[utoipa::path(
    post,
    path = "/api/v1/shipments/{id}/cancel",
    params(("id" = String, Path, description = "Shipment identifier")),
    responses(
        (status = 200, description = "Shipment cancelled", body = ShipmentResponse),
        (status = 401, description = "Not the owning seller", body = ErrorSchema),
        (status = 403, description = "Not a seller", body = ErrorSchema),
        (status = 404, description = "Unknown shipment", body = ErrorSchema),
        (status = 409, description = "Shipment already delivered or cancelled", body = ErrorSchema),
    ),
    tags = ["shipments"],
    operation_id = "cancelShipment"
)]
#[post("/shipments/{id}/cancel")]
pub async fn cancel_shipment(
    state: web::Data<HttpState>,
    seller: SellerAuth,
    path: web::Path<String>,
) -> ApiResult<web::Json<ShipmentResponse>> {
    let id = shipment_id(&path.into_inner())?;
    let shipment = state
        .shipments
        .cancel(SellerShipmentRequest {
            seller: seller.principal(),
            shipment_id: id,
        })
        .await?;
    Ok(web::Json(shipment.into()))
}

/// Remove a shipment together with its timeline.
#[utoipa::path(
    delete,
    path = "/api/v1/shipments/{id}",
    params(("id" = String, Path, description = "Shipment identifier")),
    responses(
        (status = 204, description = "Shipment removed"),
        (status = 401, description = "Not the owning seller", body = ErrorSchema),
        (status = 403, description = "Not a seller", body = ErrorSchema),
        (status = 404, description = "Unknown shipment", body = ErrorSchema),
    ),
    tags = ["shipments"],
    operation_id = "deleteShipment"
)]
#[delete("/shipments/{id}")]
pub async fn delete_shipment(
    state: web::Data<HttpState>,
    seller: SellerAuth,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = shipment_id(&path.into_inner())?;
    state
        .shipments
        .delete(SellerShipmentRequest {
            seller: seller.principal(),
            shipment_id: id,
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "shipments_tests.rs"]
mod tests;
