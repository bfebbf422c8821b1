//! PostgreSQL-backed `ShipmentRepository` implementation using Diesel ORM.
//!
//! Partner assignment locks every partner row serving the destination
//! (`SELECT ... FOR UPDATE`, ascending id) before counting their shipments,
//! so two concurrent placements cannot both take a partner's last slot.
//! Status changes are a compare-and-swap on the stored status.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound as _, Utc};
use diesel::dsl::{count_star, exists};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ShipmentRepository, ShipmentRepositoryError};
use crate::domain::{
    AccountId, EventDraft, EventId, NewShipment, PartnerCandidate, Shipment, ShipmentChange,
    ShipmentEvent, ShipmentId, ShipmentRecord, ShipmentStatus, Timeline, Weight, ZipCode,
    find_partner_for, next_event_timestamp,
};

use super::diesel_account_repository::zip_to_db;
use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{
    NewShipmentEventRow, NewShipmentRow, PartnerCandidateRow, ShipmentEventRow, ShipmentRow,
    ShipmentStateChangeset,
};
use super::pool::{DbPool, PoolError};
use super::schema::{delivery_partners, shipment_events, shipments};

/// Diesel-backed implementation of the `ShipmentRepository` port.
#[derive(Clone)]
pub struct DieselShipmentRepository {
    pool: DbPool,
}

impl DieselShipmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a transaction body: either Diesel or an outcome the port
/// reports directly. Returning it rolls the transaction back.
#[derive(Debug)]
enum TxError {
    Diesel(DieselError),
    Port(ShipmentRepositoryError),
}

impl From<DieselError> for TxError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl From<ShipmentRepositoryError> for TxError {
    fn from(error: ShipmentRepositoryError) -> Self {
        Self::Port(error)
    }
}

fn map_pool_error(error: PoolError) -> ShipmentRepositoryError {
    map_basic_pool_error(error, ShipmentRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> ShipmentRepositoryError {
    map_basic_diesel_error(
        error,
        ShipmentRepositoryError::query,
        ShipmentRepositoryError::connection,
    )
}

fn map_tx_error(error: TxError) -> ShipmentRepositoryError {
    match error {
        TxError::Diesel(error) => map_diesel_error(error),
        TxError::Port(error) => error,
    }
}

fn corrupt(row_id: Uuid, what: &str, detail: impl std::fmt::Display) -> ShipmentRepositoryError {
    debug!(%row_id, what, %detail, "stored shipment data failed validation");
    ShipmentRepositoryError::query(format!("stored {what} is invalid: {detail}"))
}

fn zip_from_db(raw: i32, row_id: Uuid) -> Result<ZipCode, ShipmentRepositoryError> {
    ZipCode::new(i64::from(raw)).map_err(|error| corrupt(row_id, "zip code", error))
}

fn status_from_db(raw: &str, row_id: Uuid) -> Result<ShipmentStatus, ShipmentRepositoryError> {
    ShipmentStatus::from_str(raw).map_err(|error| corrupt(row_id, "status", error))
}

fn event_from_row(row: ShipmentEventRow) -> Result<ShipmentEvent, ShipmentRepositoryError> {
    let location = row
        .location
        .map(|raw| zip_from_db(raw, row.id))
        .transpose()?;
    let status = row
        .status
        .as_deref()
        .map(|raw| status_from_db(raw, row.id))
        .transpose()?;
    Ok(ShipmentEvent::from_draft(
        EventId::from_uuid(row.id),
        ShipmentId::from_uuid(row.shipment_id),
        EventDraft {
            location,
            status,
            description: row.description,
        },
        row.created_at,
    ))
}

fn shipment_from_rows(
    row: ShipmentRow,
    events: Vec<ShipmentEventRow>,
) -> Result<Shipment, ShipmentRepositoryError> {
    let events = events
        .into_iter()
        .map(event_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Shipment::from(ShipmentRecord {
        id: ShipmentId::from_uuid(row.id),
        content: row.content,
        weight: Weight::new(row.weight).map_err(|error| corrupt(row.id, "weight", error))?,
        destination: zip_from_db(row.destination, row.id)?,
        status: status_from_db(&row.status, row.id)?,
        estimated_delivery: row.estimated_delivery,
        seller_id: AccountId::from_uuid(row.seller_id),
        partner_id: AccountId::from_uuid(row.partner_id),
        created_at: row.created_at,
        timeline: Timeline::from_events(events),
    }))
}

fn candidate_from_row(
    row: PartnerCandidateRow,
    assigned: i64,
) -> Result<PartnerCandidate, ShipmentRepositoryError> {
    let serviceable_zip_codes = row
        .serviceable_zip_codes
        .iter()
        .map(|raw| zip_from_db(*raw, row.id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PartnerCandidate {
        id: AccountId::from_uuid(row.id),
        name: row.name,
        serviceable_zip_codes,
        max_handling_capacity: u32::try_from(row.max_handling_capacity).unwrap_or(0),
        assigned_shipments: u32::try_from(assigned).unwrap_or(u32::MAX),
    })
}

fn event_row(event: &ShipmentEvent) -> NewShipmentEventRow<'_> {
    NewShipmentEventRow {
        id: *event.id().as_uuid(),
        shipment_id: *event.shipment_id().as_uuid(),
        location: event.location().map(zip_to_db),
        status: event.status().map(ShipmentStatus::as_str),
        description: event.description(),
        created_at: event.created_at(),
    }
}

/// Stamp for a new event, truncated to the microsecond precision PostgreSQL
/// stores before it is compared with the newest stored event.
fn event_timestamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    next_event_timestamp(last, now.trunc_subsecs(6))
}

/// Lock and snapshot every partner serving `destination`, with their load.
async fn lock_candidates(
    conn: &mut AsyncPgConnection,
    destination: ZipCode,
) -> Result<Vec<PartnerCandidate>, TxError> {
    let rows: Vec<PartnerCandidateRow> = delivery_partners::table
        .filter(delivery_partners::serviceable_zip_codes.contains(vec![zip_to_db(destination)]))
        .order(delivery_partners::id.asc())
        .select(PartnerCandidateRow::as_select())
        .for_update()
        .load(conn)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let loads: Vec<(Uuid, i64)> = shipments::table
        .filter(shipments::partner_id.eq_any(&ids))
        .group_by(shipments::partner_id)
        .select((shipments::partner_id, count_star()))
        .load(conn)
        .await?;

    rows.into_iter()
        .map(|row| {
            let assigned = loads
                .iter()
                .find(|(partner_id, _)| *partner_id == row.id)
                .map_or(0, |(_, count)| *count);
            candidate_from_row(row, assigned).map_err(TxError::from)
        })
        .collect()
}

async fn load_shipment(
    conn: &mut AsyncPgConnection,
    shipment_id: Uuid,
) -> Result<Option<Shipment>, TxError> {
    let Some(row) = shipments::table
        .find(shipment_id)
        .select(ShipmentRow::as_select())
        .first(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };
    let events: Vec<ShipmentEventRow> = shipment_events::table
        .filter(shipment_events::shipment_id.eq(shipment_id))
        .order((shipment_events::created_at.asc(), shipment_events::id.asc()))
        .select(ShipmentEventRow::as_select())
        .load(conn)
        .await?;
    Ok(Some(shipment_from_rows(row, events)?))
}

#[async_trait]
impl ShipmentRepository for DieselShipmentRepository {
    async fn create_assigned(
        &self,
        shipment: NewShipment,
    ) -> Result<Shipment, ShipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let candidates = lock_candidates(conn, shipment.destination).await?;
                let partner = find_partner_for(shipment.destination, &candidates).map_err(
                    |error| ShipmentRepositoryError::no_partner_available(error.destination.value()),
                )?;
                let placed = shipment.into_shipment(partner.id, &partner.name);

                let row = NewShipmentRow {
                    id: *placed.id().as_uuid(),
                    content: placed.content(),
                    weight: placed.weight().value(),
                    destination: zip_to_db(placed.destination()),
                    status: placed.status().as_str(),
                    estimated_delivery: placed.estimated_delivery(),
                    seller_id: *placed.seller_id().as_uuid(),
                    partner_id: *placed.partner_id().as_uuid(),
                    created_at: placed.created_at(),
                    updated_at: placed.created_at(),
                };
                diesel::insert_into(shipments::table)
                    .values(&row)
                    .execute(conn)
                    .await?;

                let events: Vec<NewShipmentEventRow<'_>> =
                    placed.timeline().events().iter().map(event_row).collect();
                diesel::insert_into(shipment_events::table)
                    .values(&events)
                    .execute(conn)
                    .await?;

                Ok::<_, TxError>(placed)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn find_by_id(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<Shipment>, ShipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *shipment_id.as_uuid();

        // Read shipment and events in one transaction so they observe a
        // consistent snapshot.
        conn.transaction(|conn| async move { load_shipment(conn, id).await }.scope_boxed())
            .await
            .map_err(map_tx_error)
    }

    async fn apply_change(
        &self,
        shipment_id: &ShipmentId,
        change: ShipmentChange,
    ) -> Result<Shipment, ShipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *shipment_id.as_uuid();

        conn.transaction(|conn| {
            async move {
                let changeset = ShipmentStateChangeset {
                    status: change.status.as_str(),
                    estimated_delivery: change.estimated_delivery,
                    updated_at: change.at,
                };
                let updated = diesel::update(
                    shipments::table
                        .filter(shipments::id.eq(id))
                        .filter(shipments::status.eq(change.expected_status.as_str())),
                )
                .set(&changeset)
                .execute(conn)
                .await?;

                if updated == 0 {
                    let present: bool = diesel::select(exists(shipments::table.find(id)))
                        .get_result(conn)
                        .await?;
                    let shipment_id = id.to_string();
                    return Err(TxError::from(if present {
                        ShipmentRepositoryError::status_conflict(shipment_id)
                    } else {
                        ShipmentRepositoryError::not_found(shipment_id)
                    }));
                }

                if let Some(draft) = change.event {
                    let last: Option<DateTime<Utc>> = shipment_events::table
                        .filter(shipment_events::shipment_id.eq(id))
                        .select(diesel::dsl::max(shipment_events::created_at))
                        .get_result(conn)
                        .await?;
                    let event = ShipmentEvent::from_draft(
                        EventId::random(),
                        ShipmentId::from_uuid(id),
                        draft,
                        event_timestamp(last, change.at),
                    );
                    diesel::insert_into(shipment_events::table)
                        .values(&event_row(&event))
                        .execute(conn)
                        .await?;
                }

                let shipment = load_shipment(conn, id).await?.ok_or_else(|| {
                    TxError::from(ShipmentRepositoryError::not_found(id.to_string()))
                })?;
                Ok::<_, TxError>(shipment)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn delete(&self, shipment_id: &ShipmentId) -> Result<bool, ShipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(shipments::table.find(shipment_id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row mapping coverage. Locking, the status compare-and-swap and the
    //! cascading delete run against embedded PostgreSQL in
    //! `tests/diesel_shipment_repository.rs`.
    use super::*;
    use rstest::rstest;

    fn shipment_row(status: &str) -> ShipmentRow {
        ShipmentRow {
            id: Uuid::new_v4(),
            content: "books".to_owned(),
            weight: 2.5,
            destination: 11_050,
            status: status.to_owned(),
            estimated_delivery: Utc::now(),
            seller_id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn rows_rebuild_shipment_with_timeline_order() {
        let row = shipment_row("in_transit");
        let shipment_id = row.id;
        let now = Utc::now();
        let events = vec![
            ShipmentEventRow {
                id: Uuid::new_v4(),
                shipment_id,
                location: Some(10_001),
                status: Some("placed".to_owned()),
                description: Some("assigned to Dan".to_owned()),
                created_at: now,
            },
            ShipmentEventRow {
                id: Uuid::new_v4(),
                shipment_id,
                location: None,
                status: Some("in_transit".to_owned()),
                description: None,
                created_at: now + chrono::Duration::minutes(5),
            },
        ];

        let shipment = shipment_from_rows(row, events).expect("valid rows");

        assert_eq!(shipment.status(), ShipmentStatus::InTransit);
        assert_eq!(shipment.timeline().len(), 2);
        let newest = shipment.timeline().newest_first().next().expect("event");
        assert_eq!(newest.status(), Some(ShipmentStatus::InTransit));
    }

    #[rstest]
    #[case("lost")]
    #[case("")]
    fn unknown_status_is_a_query_error(#[case] status: &str) {
        let error = shipment_from_rows(shipment_row(status), Vec::new())
            .expect_err("status must parse");
        assert!(matches!(error, ShipmentRepositoryError::Query { .. }));
    }

    #[rstest]
    fn candidate_load_is_carried_over() {
        let row = PartnerCandidateRow {
            id: Uuid::new_v4(),
            name: "Dan".to_owned(),
            serviceable_zip_codes: vec![11_050],
            max_handling_capacity: 2,
        };
        let candidate = candidate_from_row(row, 2).expect("valid row");

        assert!(!candidate.has_capacity());
    }

    #[rstest]
    fn event_stamps_stay_ahead_after_microsecond_truncation() {
        let stored = DateTime::from_timestamp(1_778_000_000, 123_456_000).expect("valid instant");
        let now = stored + chrono::Duration::nanoseconds(700);

        let stamped = event_timestamp(Some(stored), now);

        assert_eq!(stamped, stored + chrono::Duration::microseconds(1));
        assert_eq!(stamped, stamped.trunc_subsecs(6));
    }

    #[rstest]
    fn event_stamps_follow_the_clock_when_it_is_ahead() {
        let stored = DateTime::from_timestamp(1_778_000_000, 0).expect("valid instant");
        let now = stored + chrono::Duration::nanoseconds(2_500_900);

        let stamped = event_timestamp(Some(stored), now);

        assert_eq!(stamped, stored + chrono::Duration::nanoseconds(2_500_000));
    }

    #[rstest]
    fn tx_errors_keep_port_outcomes() {
        let error = map_tx_error(TxError::from(ShipmentRepositoryError::status_conflict("s-1")));
        assert!(matches!(error, ShipmentRepositoryError::StatusConflict { .. }));

        let error = map_tx_error(TxError::from(DieselError::NotFound));
        assert!(matches!(error, ShipmentRepositoryError::Query { .. }));
    }
}
