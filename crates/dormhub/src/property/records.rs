//! Storage-schema rows and the transformers between them and the domain model.
//!
//! Rows mirror the backing store's tables: snake_case columns, foreign keys as
//! plain strings, payment statuses in the storage vocabulary. Patches carry
//! only the columns an incremental update touches; absent fields are left out
//! of the serialized body entirely.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    Payment, PaymentId, PaymentUpdate, Room, RoomId, RoomUpdate, Tenant, TenantId, TenantUpdate,
};
use super::status::{PaymentStatus, StoragePaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact: String,
    pub move_in_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRow {
    pub id: String,
    #[serde(default)]
    pub dorm_id: Option<String>,
    pub room_number: String,
    pub floor: String,
    pub capacity: u32,
    pub rent_amount: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tenant_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRow {
    pub id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub room_id: Option<String>,
    pub amount: u32,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub paid_at: Option<NaiveDate>,
    pub status: StoragePaymentStatus,
    #[serde(default)]
    pub description: Option<String>,
}

/// Every table of the store, as exported or seeded in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSnapshot {
    #[serde(default)]
    pub tenants: Vec<TenantRow>,
    #[serde(default)]
    pub rooms: Vec<RoomRow>,
    #[serde(default)]
    pub payments: Vec<PaymentRow>,
}

pub fn tenant_from_storage(row: TenantRow) -> Tenant {
    Tenant {
        id: TenantId(row.id),
        name: row.full_name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        emergency_contact: row.emergency_contact,
        date_joined: row.move_in_date,
        room_id: row.room_id.map(RoomId),
        user_id: row.user_id,
    }
}

pub fn tenant_to_storage(tenant: &Tenant) -> TenantRow {
    TenantRow {
        id: tenant.id.0.clone(),
        user_id: tenant.user_id.clone(),
        room_id: tenant.room_id.as_ref().map(|room| room.0.clone()),
        full_name: tenant.name.clone(),
        email: tenant.email.clone(),
        phone: tenant.phone.clone(),
        address: tenant.address.clone(),
        emergency_contact: tenant.emergency_contact.clone(),
        move_in_date: tenant.date_joined,
    }
}

pub fn room_from_storage(row: RoomRow) -> Room {
    Room {
        id: RoomId(row.id),
        number: row.room_number,
        floor: row.floor,
        capacity: row.capacity,
        price: row.rent_amount,
        amenities: row.amenities,
        images: row.images,
        tenant_ids: row.tenant_ids.into_iter().map(TenantId).collect(),
        dorm_id: row.dorm_id,
    }
}

pub fn room_to_storage(room: &Room) -> RoomRow {
    RoomRow {
        id: room.id.0.clone(),
        dorm_id: room.dorm_id.clone(),
        room_number: room.number.clone(),
        floor: room.floor.clone(),
        capacity: room.capacity,
        rent_amount: room.price,
        amenities: room.amenities.clone(),
        images: room.images.clone(),
        tenant_ids: room.tenant_ids.iter().map(|id| id.0.clone()).collect(),
    }
}

/// A paid date on a row that is not completed is dropped.
pub fn payment_from_storage(row: PaymentRow) -> Payment {
    let status = row.status.to_presentation();
    let paid_date = if status.is_paid() { row.paid_at } else { None };

    Payment {
        id: PaymentId(row.id),
        tenant_id: TenantId(row.tenant_id),
        room_id: row.room_id.map(RoomId),
        amount: row.amount,
        due_date: row.payment_date,
        paid_date,
        status,
        description: row.description.unwrap_or_default(),
    }
}

pub fn payment_to_storage(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: payment.id.0.clone(),
        tenant_id: payment.tenant_id.0.clone(),
        room_id: payment.room_id.as_ref().map(|room| room.0.clone()),
        amount: payment.amount,
        payment_date: payment.due_date,
        paid_at: payment.paid_date,
        status: payment.status.to_storage(),
        description: Some(payment.description.clone()).filter(|text| !text.is_empty()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_in_date: Option<NaiveDate>,
}

impl TenantPatch {
    pub fn apply(&self, row: &mut TenantRow) {
        if let Some(name) = &self.full_name {
            row.full_name = name.clone();
        }
        if let Some(email) = &self.email {
            row.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            row.phone = phone.clone();
        }
        if let Some(address) = &self.address {
            row.address = address.clone();
        }
        if let Some(contact) = &self.emergency_contact {
            row.emergency_contact = contact.clone();
        }
        if let Some(date) = self.move_in_date {
            row.move_in_date = date;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl RoomPatch {
    pub fn apply(&self, row: &mut RoomRow) {
        if let Some(number) = &self.room_number {
            row.room_number = number.clone();
        }
        if let Some(floor) = &self.floor {
            row.floor = floor.clone();
        }
        if let Some(capacity) = self.capacity {
            row.capacity = capacity;
        }
        if let Some(rent) = self.rent_amount {
            row.rent_amount = rent;
        }
        if let Some(amenities) = &self.amenities {
            row.amenities = amenities.clone();
        }
        if let Some(images) = &self.images {
            row.images = images.clone();
        }
    }
}

/// `paid_at: Some(None)` serializes as an explicit `null` so the store clears
/// the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StoragePaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl PaymentPatch {
    /// The columns touched by a status transition.
    pub fn transition(status: PaymentStatus, paid_date: Option<NaiveDate>) -> Self {
        Self {
            status: Some(status.to_storage()),
            paid_at: Some(paid_date),
            ..Self::default()
        }
    }

    pub fn apply(&self, row: &mut PaymentRow) {
        if let Some(amount) = self.amount {
            row.amount = amount;
        }
        if let Some(date) = self.payment_date {
            row.payment_date = date;
        }
        if let Some(paid_at) = self.paid_at {
            row.paid_at = paid_at;
        }
        if let Some(status) = self.status {
            row.status = status;
        }
        if let Some(description) = &self.description {
            row.description = description.clone();
        }
    }
}

impl TenantUpdate {
    pub fn to_storage(&self) -> TenantPatch {
        TenantPatch {
            full_name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            emergency_contact: self.emergency_contact.clone(),
            move_in_date: self.date_joined,
        }
    }
}

impl RoomUpdate {
    pub fn to_storage(&self) -> RoomPatch {
        RoomPatch {
            room_number: self.number.clone(),
            floor: self.floor.clone(),
            capacity: self.capacity,
            rent_amount: self.price,
            amenities: self.amenities.clone(),
            images: self.images.clone(),
        }
    }
}

impl PaymentUpdate {
    pub fn to_storage(&self) -> PaymentPatch {
        PaymentPatch {
            amount: self.amount,
            payment_date: self.due_date,
            description: self
                .description
                .as_ref()
                .map(|text| Some(text.clone()).filter(|text| !text.is_empty())),
            ..PaymentPatch::default()
        }
    }
}
