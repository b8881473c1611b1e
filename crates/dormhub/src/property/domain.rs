use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::status::PaymentStatus;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $sequence:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        static $sequence: AtomicU64 = AtomicU64::new(1);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Allocates a fresh identifier from the process-wide sequence.
            pub fn generate() -> Self {
                let id = $sequence.fetch_add(1, Ordering::Relaxed);
                Self(format!(concat!($prefix, "-{:06}"), id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier wrapper for tenant records.
    TenantId,
    "tenant",
    TENANT_SEQUENCE
);
entity_id!(
    /// Identifier wrapper for room records.
    RoomId,
    "room",
    ROOM_SEQUENCE
);
entity_id!(
    /// Identifier wrapper for payment records.
    PaymentId,
    "payment",
    PAYMENT_SEQUENCE
);

/// A person renting a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub emergency_contact: String,
    pub date_joined: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Tenant {
    pub fn is_assigned(&self) -> bool {
        self.room_id.is_some()
    }
}

/// Occupancy state of a room. Always derived from the tenant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Occupied,
}

impl RoomStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
        }
    }
}

/// A rentable unit with a finite occupant capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub floor: String,
    pub capacity: u32,
    pub price: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tenant_ids: Vec<TenantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dorm_id: Option<String>,
}

impl Room {
    pub fn status(&self) -> RoomStatus {
        if self.tenant_ids.is_empty() {
            RoomStatus::Available
        } else {
            RoomStatus::Occupied
        }
    }

    pub fn occupants(&self) -> usize {
        self.tenant_ids.len()
    }

    pub fn is_full(&self) -> bool {
        self.tenant_ids.len() >= self.capacity as usize
    }

    pub fn houses(&self, tenant: &TenantId) -> bool {
        self.tenant_ids.contains(tenant)
    }
}

/// A billed rent charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    pub amount: u32,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    #[serde(default)]
    pub description: String,
}

impl Payment {
    /// Settles the charge, stamping the paid date.
    pub fn mark_paid(&mut self, on: NaiveDate) {
        self.status = PaymentStatus::Paid;
        self.paid_date = Some(on);
    }

    /// Reverts a settled charge; the paid date goes with it.
    pub fn mark_unpaid(&mut self) {
        self.status = PaymentStatus::Pending;
        self.paid_date = None;
    }

    pub fn mark_overdue(&mut self) {
        self.status = PaymentStatus::Overdue;
        self.paid_date = None;
    }

    pub fn is_settled(&self) -> bool {
        self.status.is_paid()
    }
}

/// Rejections raised while turning a draft into an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("`{0}` is not a valid email address")]
    InvalidEmail(String),
    #[error("room capacity must be at least one")]
    ZeroCapacity,
    #[error("payment amount must be greater than zero")]
    ZeroAmount,
    #[error("a paid date is only allowed on paid payments")]
    PaidDateOnUnpaid,
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, DraftError> {
    match value.map(|text| text.trim().to_string()) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(DraftError::MissingField(field)),
    }
}

fn optional_text(value: Option<String>) -> String {
    value.map(|text| text.trim().to_string()).unwrap_or_default()
}

fn validate_email(email: String) -> Result<String, DraftError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(DraftError::InvalidEmail(email)),
    }
}

/// Admin form input for a new tenant. Room placement goes through the
/// occupancy engine, never through the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub date_joined: Option<NaiveDate>,
    pub user_id: Option<String>,
}

impl TenantDraft {
    pub fn build(self, id: TenantId) -> Result<Tenant, DraftError> {
        let name = required_text(self.name, "name")?;
        let email = validate_email(required_text(self.email, "email")?)?;
        let date_joined = self
            .date_joined
            .ok_or(DraftError::MissingField("dateJoined"))?;

        Ok(Tenant {
            id,
            name,
            email,
            phone: optional_text(self.phone),
            address: optional_text(self.address),
            emergency_contact: optional_text(self.emergency_contact),
            date_joined,
            room_id: None,
            user_id: self.user_id,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomDraft {
    pub number: Option<String>,
    pub floor: Option<String>,
    pub capacity: Option<u32>,
    pub price: Option<u32>,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub dorm_id: Option<String>,
}

impl RoomDraft {
    pub fn build(self, id: RoomId) -> Result<Room, DraftError> {
        let number = required_text(self.number, "number")?;
        let floor = required_text(self.floor, "floor")?;
        let capacity = self.capacity.ok_or(DraftError::MissingField("capacity"))?;
        if capacity == 0 {
            return Err(DraftError::ZeroCapacity);
        }
        let price = self.price.ok_or(DraftError::MissingField("price"))?;

        Ok(Room {
            id,
            number,
            floor,
            capacity,
            price,
            amenities: self.amenities,
            images: self.images,
            tenant_ids: Vec::new(),
            dorm_id: self.dorm_id,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentDraft {
    pub tenant_id: Option<TenantId>,
    pub room_id: Option<RoomId>,
    pub amount: Option<u32>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
    pub paid_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl PaymentDraft {
    /// Builds the payment; a paid draft without a paid date is stamped `today`.
    pub fn build(self, id: PaymentId, today: NaiveDate) -> Result<Payment, DraftError> {
        let tenant_id = self.tenant_id.ok_or(DraftError::MissingField("tenantId"))?;
        let amount = self.amount.ok_or(DraftError::MissingField("amount"))?;
        if amount == 0 {
            return Err(DraftError::ZeroAmount);
        }
        let due_date = self.due_date.ok_or(DraftError::MissingField("dueDate"))?;
        let status = self.status.unwrap_or(PaymentStatus::Pending);

        let paid_date = match (status, self.paid_date) {
            (PaymentStatus::Paid, date) => Some(date.unwrap_or(today)),
            (_, Some(_)) => return Err(DraftError::PaidDateOnUnpaid),
            (_, None) => None,
        };

        Ok(Payment {
            id,
            tenant_id,
            room_id: self.room_id,
            amount,
            due_date,
            paid_date,
            status,
            description: optional_text(self.description),
        })
    }
}

/// Partial edit of a tenant's contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub date_joined: Option<NaiveDate>,
}

impl TenantUpdate {
    /// Trims and checks the fields present in the edit.
    pub fn validated(self) -> Result<Self, DraftError> {
        let name = match self.name {
            Some(name) => Some(required_text(Some(name), "name")?),
            None => None,
        };
        let email = match self.email {
            Some(email) => Some(validate_email(required_text(Some(email), "email")?)?),
            None => None,
        };
        Ok(Self {
            name,
            email,
            phone: self.phone.map(|phone| phone.trim().to_string()),
            address: self.address.map(|address| address.trim().to_string()),
            emergency_contact: self
                .emergency_contact
                .map(|contact| contact.trim().to_string()),
            date_joined: self.date_joined,
        })
    }

    pub fn apply(self, tenant: &mut Tenant) -> Result<(), DraftError> {
        let update = self.validated()?;
        if let Some(name) = update.name {
            tenant.name = name;
        }
        if let Some(email) = update.email {
            tenant.email = email;
        }
        if let Some(phone) = update.phone {
            tenant.phone = phone;
        }
        if let Some(address) = update.address {
            tenant.address = address;
        }
        if let Some(contact) = update.emergency_contact {
            tenant.emergency_contact = contact;
        }
        if let Some(date) = update.date_joined {
            tenant.date_joined = date;
        }
        Ok(())
    }
}

/// Partial edit of a room's listing attributes. Membership is not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomUpdate {
    pub number: Option<String>,
    pub floor: Option<String>,
    pub capacity: Option<u32>,
    pub price: Option<u32>,
    pub amenities: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl RoomUpdate {
    /// Trims and checks the fields present in the edit. Capacity limits
    /// against current occupants are enforced where membership is known.
    pub fn validated(self) -> Result<Self, DraftError> {
        let number = match self.number {
            Some(number) => Some(required_text(Some(number), "number")?),
            None => None,
        };
        let floor = match self.floor {
            Some(floor) => Some(required_text(Some(floor), "floor")?),
            None => None,
        };
        if self.capacity == Some(0) {
            return Err(DraftError::ZeroCapacity);
        }
        Ok(Self {
            number,
            floor,
            ..self
        })
    }

    pub fn apply(self, room: &mut Room) -> Result<(), DraftError> {
        let update = self.validated()?;
        if let Some(number) = update.number {
            room.number = number;
        }
        if let Some(floor) = update.floor {
            room.floor = floor;
        }
        if let Some(capacity) = update.capacity {
            room.capacity = capacity;
        }
        if let Some(price) = update.price {
            room.price = price;
        }
        if let Some(amenities) = update.amenities {
            room.amenities = amenities;
        }
        if let Some(images) = update.images {
            room.images = images;
        }
        Ok(())
    }
}

/// Partial edit of a charge. Status changes go through the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentUpdate {
    pub amount: Option<u32>,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl PaymentUpdate {
    pub fn apply(self, payment: &mut Payment) -> Result<(), DraftError> {
        if let Some(amount) = self.amount {
            if amount == 0 {
                return Err(DraftError::ZeroAmount);
            }
            payment.amount = amount;
        }
        if let Some(due_date) = self.due_date {
            payment.due_date = due_date;
        }
        if let Some(description) = self.description {
            payment.description = description.trim().to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn room_status_follows_tenant_list() {
        let mut room = RoomDraft {
            number: Some("101".to_string()),
            floor: Some("1".to_string()),
            capacity: Some(2),
            price: Some(500),
            ..RoomDraft::default()
        }
        .build(RoomId::new("r1"))
        .expect("valid room");
        assert_eq!(room.status(), RoomStatus::Available);

        room.tenant_ids.push(TenantId::new("t1"));
        assert_eq!(room.status(), RoomStatus::Occupied);
        assert!(!room.is_full());
    }

    #[test]
    fn tenant_draft_requires_name_email_and_join_date() {
        let draft = TenantDraft {
            name: Some("  ".to_string()),
            email: Some("ada@example.com".to_string()),
            date_joined: Some(date(2024, 1, 1)),
            ..TenantDraft::default()
        };
        assert_eq!(
            draft.build(TenantId::new("t1")),
            Err(DraftError::MissingField("name"))
        );

        let draft = TenantDraft {
            name: Some("Ada".to_string()),
            email: Some("not-an-email".to_string()),
            date_joined: Some(date(2024, 1, 1)),
            ..TenantDraft::default()
        };
        assert!(matches!(
            draft.build(TenantId::new("t1")),
            Err(DraftError::InvalidEmail(_))
        ));

        let draft = TenantDraft {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            ..TenantDraft::default()
        };
        assert_eq!(
            draft.build(TenantId::new("t1")),
            Err(DraftError::MissingField("dateJoined"))
        );
    }

    #[test]
    fn tenant_draft_never_places_tenant() {
        let tenant = TenantDraft {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            date_joined: Some(date(2024, 1, 1)),
            ..TenantDraft::default()
        }
        .build(TenantId::new("t1"))
        .expect("valid tenant");
        assert!(!tenant.is_assigned());
        assert_eq!(tenant.phone, "");
    }

    #[test]
    fn room_draft_rejects_zero_capacity() {
        let draft = RoomDraft {
            number: Some("101".to_string()),
            floor: Some("1".to_string()),
            capacity: Some(0),
            price: Some(500),
            ..RoomDraft::default()
        };
        assert_eq!(draft.build(RoomId::new("r1")), Err(DraftError::ZeroCapacity));
    }

    #[test]
    fn paid_drafts_get_a_paid_date() {
        let today = date(2024, 3, 10);
        let payment = PaymentDraft {
            tenant_id: Some(TenantId::new("t1")),
            amount: Some(500),
            due_date: Some(date(2024, 3, 1)),
            status: Some(PaymentStatus::Paid),
            ..PaymentDraft::default()
        }
        .build(PaymentId::new("p1"), today)
        .expect("valid payment");
        assert_eq!(payment.paid_date, Some(today));

        let rejected = PaymentDraft {
            tenant_id: Some(TenantId::new("t1")),
            amount: Some(500),
            due_date: Some(date(2024, 3, 1)),
            paid_date: Some(today),
            ..PaymentDraft::default()
        }
        .build(PaymentId::new("p2"), today);
        assert_eq!(rejected, Err(DraftError::PaidDateOnUnpaid));
    }

    #[test]
    fn unpaid_clears_paid_date() {
        let mut payment = PaymentDraft {
            tenant_id: Some(TenantId::new("t1")),
            amount: Some(500),
            due_date: Some(date(2024, 3, 1)),
            status: Some(PaymentStatus::Paid),
            ..PaymentDraft::default()
        }
        .build(PaymentId::new("p1"), date(2024, 3, 2))
        .expect("valid payment");

        payment.mark_unpaid();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.paid_date, None);

        payment.mark_paid(date(2024, 3, 9));
        assert_eq!(payment.paid_date, Some(date(2024, 3, 9)));
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let first = TenantId::generate();
        let second = TenantId::generate();
        assert!(first.as_str().starts_with("tenant-"));
        assert_ne!(first, second);
    }

    #[test]
    fn tenant_update_validates_email() {
        let mut tenant = TenantDraft {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            date_joined: Some(date(2024, 1, 1)),
            ..TenantDraft::default()
        }
        .build(TenantId::new("t1"))
        .expect("valid tenant");

        let update = TenantUpdate {
            email: Some("broken".to_string()),
            ..TenantUpdate::default()
        };
        assert!(update.apply(&mut tenant).is_err());
        assert_eq!(tenant.email, "ada@example.com");

        let update = TenantUpdate {
            phone: Some(" 555-0101 ".to_string()),
            ..TenantUpdate::default()
        };
        update.apply(&mut tenant).expect("phone edit applies");
        assert_eq!(tenant.phone, "555-0101");
    }
}
