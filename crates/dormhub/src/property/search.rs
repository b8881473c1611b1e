use std::cmp::Reverse;

use serde::Deserialize;

use super::domain::{Payment, Room, Tenant};
use super::status::PaymentStatus;

/// Free-text search over tenants: name, email, or phone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TenantFilter {
    #[serde(default, rename = "q")]
    pub query: String,
}

impl TenantFilter {
    pub fn matches(&self, tenant: &Tenant) -> bool {
        let needle = self.query.trim().to_lowercase();
        needle.is_empty()
            || tenant.name.to_lowercase().contains(&needle)
            || tenant.email.to_lowercase().contains(&needle)
            || tenant.phone.contains(self.query.trim())
    }

    pub fn apply(&self, tenants: Vec<Tenant>) -> Vec<Tenant> {
        tenants
            .into_iter()
            .filter(|tenant| self.matches(tenant))
            .collect()
    }
}

/// Free-text search over rooms: number, floor, or occupancy status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoomFilter {
    #[serde(default, rename = "q")]
    pub query: String,
}

impl RoomFilter {
    pub fn matches(&self, room: &Room) -> bool {
        let raw = self.query.trim();
        raw.is_empty()
            || room.number.contains(raw)
            || room.floor.contains(raw)
            || room.status().label().contains(&raw.to_lowercase())
    }

    pub fn apply(&self, rooms: Vec<Room>) -> Vec<Room> {
        rooms.into_iter().filter(|room| self.matches(room)).collect()
    }
}

/// Payment search by tenant name, room number, or description, narrowed to a
/// set of statuses. An empty status set admits every status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub query: String,
    pub statuses: Vec<PaymentStatus>,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment, tenants: &[Tenant], rooms: &[Room]) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&payment.status) {
            return false;
        }

        let raw = self.query.trim();
        if raw.is_empty() {
            return true;
        }
        let needle = raw.to_lowercase();

        let tenant_matches = tenants
            .iter()
            .find(|tenant| tenant.id == payment.tenant_id)
            .is_some_and(|tenant| tenant.name.to_lowercase().contains(&needle));
        let room_matches = payment.room_id.as_ref().is_some_and(|room_id| {
            rooms
                .iter()
                .find(|room| room.id == *room_id)
                .is_some_and(|room| room.number.contains(raw))
        });

        tenant_matches || room_matches || payment.description.to_lowercase().contains(&needle)
    }

    /// Matching payments, latest due date first.
    pub fn apply(&self, payments: Vec<Payment>, tenants: &[Tenant], rooms: &[Room]) -> Vec<Payment> {
        let mut matched: Vec<Payment> = payments
            .into_iter()
            .filter(|payment| self.matches(payment, tenants, rooms))
            .collect();
        matched.sort_by_key(|payment| Reverse(payment.due_date));
        matched
    }
}
