use super::domain::{Payment, PaymentId, Room, RoomId, Tenant, TenantId};
use super::records::{RoomPatch, TenantPatch};

/// A room's tenant list as an operation read it and as it should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMembers {
    pub room: RoomId,
    pub expected: Vec<TenantId>,
    pub tenant_ids: Vec<TenantId>,
}

impl RoomMembers {
    pub fn between(before: &Room, after: &Room) -> Self {
        Self {
            room: after.id.clone(),
            expected: before.tenant_ids.clone(),
            tenant_ids: after.tenant_ids.clone(),
        }
    }
}

/// A tenant's room reference as an operation read it and as it should be
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantPlacement {
    pub tenant: TenantId,
    pub expected: Option<RoomId>,
    pub room_id: Option<RoomId>,
}

impl TenantPlacement {
    pub fn between(before: &Tenant, after: &Tenant) -> Self {
        Self {
            tenant: after.id.clone(),
            expected: before.room_id.clone(),
            room_id: after.room_id.clone(),
        }
    }

    /// Deletes the tenant, provided it still references the room it was read with.
    pub fn removal(tenant: &Tenant) -> Self {
        Self {
            tenant: tenant.id.clone(),
            expected: tenant.room_id.clone(),
            room_id: None,
        }
    }
}

/// The occupancy writes produced by one operation. Repositories check every
/// `expected` value against the stored records and apply the writes
/// all-or-nothing under one lock, failing with [`RepositoryError::Stale`]
/// when a record moved since it was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyChange {
    pub rooms: Vec<RoomMembers>,
    pub tenant: Option<TenantPlacement>,
    pub removed_tenant: Option<TenantPlacement>,
}

/// Storage abstraction the rule engine and ledger are written against.
///
/// Only [`PropertyRepository::commit`] writes room membership or tenant
/// placement. Listing and contact edits are field patches that leave both
/// untouched.
pub trait PropertyRepository: Send + Sync {
    fn tenants(&self) -> Result<Vec<Tenant>, RepositoryError>;
    fn tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;
    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError>;
    fn update_tenant(&self, id: &TenantId, patch: TenantPatch) -> Result<Tenant, RepositoryError>;

    fn rooms(&self) -> Result<Vec<Room>, RepositoryError>;
    fn room(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError>;
    fn insert_room(&self, room: Room) -> Result<Room, RepositoryError>;
    /// Applies a listing patch. A capacity below the stored occupant count is `Stale`.
    fn update_room(&self, id: &RoomId, patch: RoomPatch) -> Result<Room, RepositoryError>;
    fn add_room_image(&self, id: &RoomId, url: String) -> Result<Room, RepositoryError>;
    /// Removes an empty room. A room that gained tenants is `Stale`.
    fn delete_room(&self, id: &RoomId) -> Result<(), RepositoryError>;

    fn payments(&self) -> Result<Vec<Payment>, RepositoryError>;
    fn payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError>;
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError>;

    /// Writes every record in `change` or none of them.
    fn commit(&self, change: OccupancyChange) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("{0} changed while the request was in flight")]
    Stale(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
