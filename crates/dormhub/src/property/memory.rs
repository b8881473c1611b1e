use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{Payment, PaymentId, Room, RoomId, Tenant, TenantId};
use super::occupancy::{audit, OccupancyViolation};
use super::records::{
    payment_from_storage, payment_to_storage, room_from_storage, room_to_storage,
    tenant_from_storage, tenant_to_storage, RoomPatch, StorageSnapshot, TenantPatch,
};
use super::repository::{OccupancyChange, PropertyRepository, RepositoryError};

#[derive(Debug, Default)]
struct PropertyTables {
    tenants: BTreeMap<TenantId, Tenant>,
    rooms: BTreeMap<RoomId, Room>,
    payments: BTreeMap<PaymentId, Payment>,
}

/// A snapshot whose room lists and tenant references disagree.
#[derive(Debug, thiserror::Error)]
#[error("snapshot rejected: {}", describe(.violations))]
pub struct InconsistentSnapshot {
    pub violations: Vec<OccupancyViolation>,
}

fn describe(violations: &[OccupancyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Process-local store. One mutex guards all three tables so a commit is
/// observed whole or not at all.
#[derive(Debug, Default)]
pub struct InMemoryPropertyRepository {
    tables: Mutex<PropertyTables>,
}

impl InMemoryPropertyRepository {
    /// Loads storage rows, refusing any snapshot that breaks the occupancy rules.
    pub fn from_snapshot(snapshot: StorageSnapshot) -> Result<Self, InconsistentSnapshot> {
        let StorageSnapshot {
            tenants,
            rooms,
            payments,
        } = snapshot;

        let tenants: Vec<Tenant> = tenants.into_iter().map(tenant_from_storage).collect();
        let rooms: Vec<Room> = rooms.into_iter().map(room_from_storage).collect();
        let violations = audit(&rooms, &tenants);
        if !violations.is_empty() {
            return Err(InconsistentSnapshot { violations });
        }

        let tables = PropertyTables {
            tenants: tenants
                .into_iter()
                .map(|tenant| (tenant.id.clone(), tenant))
                .collect(),
            rooms: rooms.into_iter().map(|room| (room.id.clone(), room)).collect(),
            payments: payments
                .into_iter()
                .map(payment_from_storage)
                .map(|payment| (payment.id.clone(), payment))
                .collect(),
        };

        Ok(Self {
            tables: Mutex::new(tables),
        })
    }

    /// Exports every table in the storage schema.
    pub fn snapshot(&self) -> Result<StorageSnapshot, RepositoryError> {
        let tables = self.tables()?;
        Ok(StorageSnapshot {
            tenants: tables.tenants.values().map(tenant_to_storage).collect(),
            rooms: tables.rooms.values().map(room_to_storage).collect(),
            payments: tables.payments.values().map(payment_to_storage).collect(),
        })
    }

    fn tables(&self) -> Result<MutexGuard<'_, PropertyTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

/// Fails unless every expectation in `change` still holds for `tables`.
fn verify(tables: &PropertyTables, change: &OccupancyChange) -> Result<(), RepositoryError> {
    for write in &change.rooms {
        let room = tables
            .rooms
            .get(&write.room)
            .ok_or(RepositoryError::NotFound)?;
        if room.tenant_ids != write.expected {
            return Err(RepositoryError::Stale(format!("room {}", write.room)));
        }
        let grows = write.tenant_ids.len() > write.expected.len();
        if grows && write.tenant_ids.len() > room.capacity as usize {
            return Err(RepositoryError::Stale(format!("room {} capacity", write.room)));
        }
    }

    for placement in change.tenant.iter().chain(change.removed_tenant.iter()) {
        let tenant = tables
            .tenants
            .get(&placement.tenant)
            .ok_or(RepositoryError::NotFound)?;
        if tenant.room_id != placement.expected {
            return Err(RepositoryError::Stale(format!("tenant {}", placement.tenant)));
        }
    }
    Ok(())
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn tenants(&self) -> Result<Vec<Tenant>, RepositoryError> {
        Ok(self.tables()?.tenants.values().cloned().collect())
    }

    fn tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.tables()?.tenants.get(id).cloned())
    }

    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.tenants.contains_key(&tenant.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }

    fn update_tenant(&self, id: &TenantId, patch: TenantPatch) -> Result<Tenant, RepositoryError> {
        let mut tables = self.tables()?;
        let slot = tables.tenants.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let mut row = tenant_to_storage(slot);
        patch.apply(&mut row);
        *slot = tenant_from_storage(row);
        Ok(slot.clone())
    }

    fn rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        Ok(self.tables()?.rooms.values().cloned().collect())
    }

    fn room(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        Ok(self.tables()?.rooms.get(id).cloned())
    }

    fn insert_room(&self, room: Room) -> Result<Room, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.rooms.contains_key(&room.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.rooms.insert(room.id.clone(), room.clone());
        Ok(room)
    }

    fn update_room(&self, id: &RoomId, patch: RoomPatch) -> Result<Room, RepositoryError> {
        let mut tables = self.tables()?;
        let slot = tables.rooms.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if patch
            .capacity
            .is_some_and(|capacity| (capacity as usize) < slot.occupants())
        {
            return Err(RepositoryError::Stale(format!("room {id} occupancy")));
        }
        let mut row = room_to_storage(slot);
        patch.apply(&mut row);
        *slot = room_from_storage(row);
        Ok(slot.clone())
    }

    fn add_room_image(&self, id: &RoomId, url: String) -> Result<Room, RepositoryError> {
        let mut tables = self.tables()?;
        let slot = tables.rooms.get_mut(id).ok_or(RepositoryError::NotFound)?;
        slot.images.push(url);
        Ok(slot.clone())
    }

    fn delete_room(&self, id: &RoomId) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let room = tables.rooms.get(id).ok_or(RepositoryError::NotFound)?;
        if !room.tenant_ids.is_empty() {
            return Err(RepositoryError::Stale(format!("room {id} occupancy")));
        }
        tables.rooms.remove(id);
        Ok(())
    }

    fn payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        Ok(self.tables()?.payments.values().cloned().collect())
    }

    fn payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.tables()?.payments.get(id).cloned())
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.payments.contains_key(&payment.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.payments.insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.payments.get_mut(&payment.id) {
            Some(slot) => {
                *slot = payment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn commit(&self, change: OccupancyChange) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        verify(&tables, &change)?;

        for write in change.rooms {
            if let Some(room) = tables.rooms.get_mut(&write.room) {
                room.tenant_ids = write.tenant_ids;
            }
        }
        if let Some(placement) = change.tenant {
            if let Some(tenant) = tables.tenants.get_mut(&placement.tenant) {
                tenant.room_id = placement.room_id;
            }
        }
        if let Some(removal) = change.removed_tenant {
            tables.tenants.remove(&removal.tenant);
        }
        Ok(())
    }
}
