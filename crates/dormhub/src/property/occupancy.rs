//! Tenant placement rules.
//!
//! Every operation loads the records it touches, validates the whole
//! transition, and only then hands a single [`OccupancyChange`] to the
//! repository. A rejected operation never writes. The change carries the
//! membership and placement the operation read, so a writer that lost a race
//! gets [`RepositoryError::Stale`] instead of overwriting the winner.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Room, RoomId, Tenant, TenantId};
use super::repository::{
    OccupancyChange, PropertyRepository, RepositoryError, RoomMembers, TenantPlacement,
};

/// Tenant and the room an operation placed them in or removed them from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub tenant: Tenant,
    pub room: Room,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    pub tenant: Tenant,
    pub from: Room,
    pub to: Room,
}

#[derive(Debug, thiserror::Error)]
pub enum OccupancyError {
    #[error("room {room} is full ({capacity} of {capacity} places taken)")]
    CapacityExceeded { room: RoomId, capacity: u32 },
    #[error("tenant {tenant} is already assigned to room {room}")]
    AlreadyAssigned { tenant: TenantId, room: RoomId },
    #[error("tenant {0} is not assigned to a room")]
    NotAssigned(TenantId),
    #[error("room {room} still houses {occupants} tenant(s)")]
    RoomOccupied { room: RoomId, occupants: usize },
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

impl OccupancyError {
    /// Rule violations, as opposed to missing records or store failures.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            OccupancyError::CapacityExceeded { .. }
                | OccupancyError::AlreadyAssigned { .. }
                | OccupancyError::NotAssigned(_)
                | OccupancyError::RoomOccupied { .. }
        )
    }
}

fn check_vacancy(room: &Room) -> Result<(), OccupancyError> {
    if room.is_full() {
        return Err(OccupancyError::CapacityExceeded {
            room: room.id.clone(),
            capacity: room.capacity,
        });
    }
    Ok(())
}

/// Places `tenant` into `room`, returning the updated pair.
pub fn plan_assignment(tenant: &Tenant, room: &Room) -> Result<Assignment, OccupancyError> {
    if let Some(current) = &tenant.room_id {
        return Err(OccupancyError::AlreadyAssigned {
            tenant: tenant.id.clone(),
            room: current.clone(),
        });
    }
    if room.houses(&tenant.id) {
        return Err(OccupancyError::AlreadyAssigned {
            tenant: tenant.id.clone(),
            room: room.id.clone(),
        });
    }
    check_vacancy(room)?;

    let mut tenant = tenant.clone();
    let mut room = room.clone();
    room.tenant_ids.push(tenant.id.clone());
    tenant.room_id = Some(room.id.clone());
    Ok(Assignment { tenant, room })
}

/// Removes `tenant` from `room`, which must be the room the tenant references.
pub fn plan_unassignment(tenant: &Tenant, room: &Room) -> Result<Assignment, OccupancyError> {
    match &tenant.room_id {
        Some(current) if *current == room.id => {}
        _ => return Err(OccupancyError::NotAssigned(tenant.id.clone())),
    }

    let mut tenant = tenant.clone();
    let mut room = room.clone();
    room.tenant_ids.retain(|id| *id != tenant.id);
    tenant.room_id = None;
    Ok(Assignment { tenant, room })
}

/// Applies the placement rules against an injected repository.
pub struct OccupancyEngine<R> {
    repository: Arc<R>,
}

impl<R> OccupancyEngine<R>
where
    R: PropertyRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    fn load_tenant(&self, id: &TenantId) -> Result<Tenant, OccupancyError> {
        self.repository
            .tenant(id)?
            .ok_or_else(|| OccupancyError::TenantNotFound(id.clone()))
    }

    fn load_room(&self, id: &RoomId) -> Result<Room, OccupancyError> {
        self.repository
            .room(id)?
            .ok_or_else(|| OccupancyError::RoomNotFound(id.clone()))
    }

    fn reject<T>(&self, operation: &str, err: OccupancyError) -> Result<T, OccupancyError> {
        if err.is_rule_violation() {
            warn!(operation, error = %err, "occupancy change rejected");
        }
        Err(err)
    }

    pub fn assign(
        &self,
        tenant_id: &TenantId,
        room_id: &RoomId,
    ) -> Result<Assignment, OccupancyError> {
        let tenant = self.load_tenant(tenant_id)?;
        let room = self.load_room(room_id)?;
        let assignment = match plan_assignment(&tenant, &room) {
            Ok(assignment) => assignment,
            Err(err) => return self.reject("assign", err),
        };

        self.repository.commit(OccupancyChange {
            rooms: vec![RoomMembers::between(&room, &assignment.room)],
            tenant: Some(TenantPlacement::between(&tenant, &assignment.tenant)),
            removed_tenant: None,
        })?;

        info!(tenant = %tenant_id, room = %room_id, occupants = assignment.room.occupants(), "tenant assigned");
        Ok(assignment)
    }

    pub fn unassign(&self, tenant_id: &TenantId) -> Result<Assignment, OccupancyError> {
        let tenant = self.load_tenant(tenant_id)?;
        let Some(room_id) = tenant.room_id.clone() else {
            return self.reject("unassign", OccupancyError::NotAssigned(tenant_id.clone()));
        };
        let room = self.load_room(&room_id)?;
        let released = plan_unassignment(&tenant, &room)?;

        self.repository.commit(OccupancyChange {
            rooms: vec![RoomMembers::between(&room, &released.room)],
            tenant: Some(TenantPlacement::between(&tenant, &released.tenant)),
            removed_tenant: None,
        })?;

        info!(tenant = %tenant_id, room = %room_id, status = released.room.status().label(), "tenant unassigned");
        Ok(released)
    }

    /// Removes the tenant record, releasing their room in the same commit.
    pub fn delete_tenant(&self, tenant_id: &TenantId) -> Result<Tenant, OccupancyError> {
        let tenant = self.load_tenant(tenant_id)?;

        let mut rooms = Vec::new();
        if let Some(room_id) = &tenant.room_id {
            let room = self.load_room(room_id)?;
            let released = plan_unassignment(&tenant, &room)?;
            rooms.push(RoomMembers::between(&room, &released.room));
        }

        self.repository.commit(OccupancyChange {
            rooms,
            tenant: None,
            removed_tenant: Some(TenantPlacement::removal(&tenant)),
        })?;

        info!(tenant = %tenant_id, "tenant deleted");
        Ok(tenant)
    }

    pub fn delete_room(&self, room_id: &RoomId) -> Result<Room, OccupancyError> {
        let room = self.load_room(room_id)?;
        if !room.tenant_ids.is_empty() {
            return self.reject(
                "delete_room",
                OccupancyError::RoomOccupied {
                    room: room_id.clone(),
                    occupants: room.occupants(),
                },
            );
        }

        self.repository.delete_room(room_id)?;
        info!(room = %room_id, "room deleted");
        Ok(room)
    }

    /// Moves an assigned tenant. The target's capacity is checked before the
    /// source room is touched, and both rooms are written in one commit.
    pub fn reassign(
        &self,
        tenant_id: &TenantId,
        room_id: &RoomId,
    ) -> Result<Reassignment, OccupancyError> {
        let tenant = self.load_tenant(tenant_id)?;
        let Some(source_id) = tenant.room_id.clone() else {
            return self.reject("reassign", OccupancyError::NotAssigned(tenant_id.clone()));
        };
        if source_id == *room_id {
            return self.reject(
                "reassign",
                OccupancyError::AlreadyAssigned {
                    tenant: tenant_id.clone(),
                    room: source_id,
                },
            );
        }

        let source = self.load_room(&source_id)?;
        let target = self.load_room(room_id)?;
        if let Err(err) = check_vacancy(&target) {
            return self.reject("reassign", err);
        }

        let released = plan_unassignment(&tenant, &source)?;
        let placed = plan_assignment(&released.tenant, &target)?;

        self.repository.commit(OccupancyChange {
            rooms: vec![
                RoomMembers::between(&source, &released.room),
                RoomMembers::between(&target, &placed.room),
            ],
            tenant: Some(TenantPlacement::between(&tenant, &placed.tenant)),
            removed_tenant: None,
        })?;

        info!(tenant = %tenant_id, from = %source_id, to = %room_id, "tenant reassigned");
        Ok(Reassignment {
            tenant: placed.tenant,
            from: released.room,
            to: placed.room,
        })
    }
}

/// Disagreements between room membership lists and tenant references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccupancyViolation {
    OverCapacity { room: RoomId },
    UnknownTenant { room: RoomId, tenant: TenantId },
    MissingReference { room: RoomId, tenant: TenantId },
    UnlistedTenant { tenant: TenantId, room: RoomId },
    UnknownRoom { tenant: TenantId, room: RoomId },
    DuplicateTenant { room: RoomId, tenant: TenantId },
}

impl fmt::Display for OccupancyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccupancyViolation::OverCapacity { room } => {
                write!(f, "room {room} lists more tenants than it sleeps")
            }
            OccupancyViolation::UnknownTenant { room, tenant } => {
                write!(f, "room {room} lists unknown tenant {tenant}")
            }
            OccupancyViolation::MissingReference { room, tenant } => {
                write!(f, "room {room} lists tenant {tenant}, who lives elsewhere")
            }
            OccupancyViolation::UnlistedTenant { tenant, room } => {
                write!(f, "tenant {tenant} points at room {room}, which does not list them")
            }
            OccupancyViolation::UnknownRoom { tenant, room } => {
                write!(f, "tenant {tenant} points at unknown room {room}")
            }
            OccupancyViolation::DuplicateTenant { room, tenant } => {
                write!(f, "room {room} lists tenant {tenant} more than once")
            }
        }
    }
}

/// Cross-checks rooms against tenants. An empty result means the occupancy
/// model is consistent.
pub fn audit(rooms: &[Room], tenants: &[Tenant]) -> Vec<OccupancyViolation> {
    let mut violations = Vec::new();

    for room in rooms {
        if room.tenant_ids.len() > room.capacity as usize {
            violations.push(OccupancyViolation::OverCapacity {
                room: room.id.clone(),
            });
        }
        for (position, tenant_id) in room.tenant_ids.iter().enumerate() {
            if room.tenant_ids[..position].contains(tenant_id) {
                violations.push(OccupancyViolation::DuplicateTenant {
                    room: room.id.clone(),
                    tenant: tenant_id.clone(),
                });
                continue;
            }
            match tenants.iter().find(|tenant| tenant.id == *tenant_id) {
                None => violations.push(OccupancyViolation::UnknownTenant {
                    room: room.id.clone(),
                    tenant: tenant_id.clone(),
                }),
                Some(tenant) if tenant.room_id.as_ref() != Some(&room.id) => {
                    violations.push(OccupancyViolation::MissingReference {
                        room: room.id.clone(),
                        tenant: tenant_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    for tenant in tenants {
        let Some(room_id) = &tenant.room_id else {
            continue;
        };
        match rooms.iter().find(|room| room.id == *room_id) {
            None => violations.push(OccupancyViolation::UnknownRoom {
                tenant: tenant.id.clone(),
                room: room_id.clone(),
            }),
            Some(room) if !room.houses(&tenant.id) => {
                violations.push(OccupancyViolation::UnlistedTenant {
                    tenant: tenant.id.clone(),
                    room: room_id.clone(),
                })
            }
            Some(_) => {}
        }
    }

    violations
}
