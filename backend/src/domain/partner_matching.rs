//! First-fit delivery partner selection.
//!
//! The selection itself is pure. Repositories feed it a snapshot of candidate
//! partners taken inside the same transaction that persists the shipment, so
//! the capacity check and the assignment commit together.

use super::account::{AccountId, ZipCode};

/// Delivery partner as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerCandidate {
    /// Partner account.
    pub id: AccountId,
    /// Name shown in the opening timeline event.
    pub name: String,
    /// Zip codes the partner covers.
    pub serviceable_zip_codes: Vec<ZipCode>,
    /// Capacity limit.
    pub max_handling_capacity: u32,
    /// Shipments currently assigned, whatever their status.
    pub assigned_shipments: u32,
}

impl PartnerCandidate {
    /// Whether `zip_code` is covered.
    pub fn serves(&self, zip_code: ZipCode) -> bool {
        self.serviceable_zip_codes.contains(&zip_code)
    }

    /// Whether another shipment fits.
    pub fn has_capacity(&self) -> bool {
        self.assigned_shipments < self.max_handling_capacity
    }
}

/// No partner serves the destination with spare capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no delivery partner available for zip code {destination}")]
pub struct NoPartnerAvailable {
    /// Destination nobody could take.
    pub destination: ZipCode,
}

/// Pick the partner for a shipment bound to `destination`.
///
/// Candidates serving the zip code are scanned in ascending id order and the
/// first one with spare capacity wins, independent of input order.
///
/// # Examples
/// ```
/// use shiptrack::domain::{AccountId, PartnerCandidate, ZipCode, find_partner_for};
///
/// let zip = ZipCode::new(11050).unwrap();
/// let full = PartnerCandidate {
///     id: AccountId::random(),
///     name: "Full".into(),
///     serviceable_zip_codes: vec![zip],
///     max_handling_capacity: 1,
///     assigned_shipments: 1,
/// };
/// assert!(find_partner_for(zip, &[full]).is_err());
/// ```
pub fn find_partner_for(
    destination: ZipCode,
    candidates: &[PartnerCandidate],
) -> Result<&PartnerCandidate, NoPartnerAvailable> {
    candidates
        .iter()
        .filter(|candidate| candidate.serves(destination) && candidate.has_capacity())
        .min_by_key(|candidate| candidate.id)
        .ok_or(NoPartnerAvailable { destination })
}
