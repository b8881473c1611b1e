//! Tenants, rooms, and rent payments for a single boarding house.
//!
//! Records are held as domain values behind [`PropertyRepository`]. The
//! [`records`] module translates them to and from the persisted row schema,
//! [`occupancy`] enforces the placement rules, [`ledger`] owns payment status
//! transitions, and [`dashboard`] derives the headline figures on demand.

pub mod dashboard;
pub mod domain;
pub mod fixtures;
pub mod ledger;
pub mod memory;
pub mod occupancy;
pub mod records;
pub mod repository;
pub mod router;
pub mod search;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use dashboard::{DashboardStats, DashboardView, FEED_LENGTH};
pub use domain::{
    DraftError, Payment, PaymentDraft, PaymentId, PaymentUpdate, Room, RoomDraft, RoomId,
    RoomStatus, RoomUpdate, Tenant, TenantDraft, TenantId, TenantUpdate,
};
pub use ledger::{LedgerError, PaymentLedger};
pub use memory::{InMemoryPropertyRepository, InconsistentSnapshot};
pub use occupancy::{
    audit, Assignment, OccupancyEngine, OccupancyError, OccupancyViolation, Reassignment,
};
pub use records::StorageSnapshot;
pub use repository::{
    OccupancyChange, PropertyRepository, RepositoryError, RoomMembers, TenantPlacement,
};
pub use router::{property_router, PropertyState, RoomView};
pub use search::{PaymentFilter, RoomFilter, TenantFilter};
pub use service::{PropertyService, PropertyServiceError};
pub use status::{
    parse_status_list, to_presentation_status, to_storage_status, PaymentStatus,
    StatusParseError, StoragePaymentStatus,
};
