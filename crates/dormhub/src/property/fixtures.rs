//! The operator demo dataset, expressed as storage rows.

use chrono::NaiveDate;

use super::records::{PaymentRow, RoomRow, StorageSnapshot, TenantRow};
use super::status::StoragePaymentStatus;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_default()
}

fn tenant(
    id: &str,
    name: &str,
    email: &str,
    phone: &str,
    address: &str,
    emergency: &str,
    joined: &str,
) -> TenantRow {
    TenantRow {
        id: id.to_string(),
        user_id: None,
        room_id: Some(id.to_string()),
        full_name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        address: address.to_string(),
        emergency_contact: emergency.to_string(),
        move_in_date: date(joined),
    }
}

fn room(
    id: &str,
    number: &str,
    capacity: u32,
    rent: u32,
    amenities: &[&str],
    tenants: &[&str],
) -> RoomRow {
    RoomRow {
        id: id.to_string(),
        dorm_id: None,
        room_number: number.to_string(),
        floor: number[..1].to_string(),
        capacity,
        rent_amount: rent,
        amenities: amenities.iter().map(|item| item.to_string()).collect(),
        images: Vec::new(),
        tenant_ids: tenants.iter().map(|item| item.to_string()).collect(),
    }
}

fn payment(
    id: &str,
    tenant: &str,
    amount: u32,
    due: &str,
    paid: Option<&str>,
    status: StoragePaymentStatus,
    description: &str,
) -> PaymentRow {
    PaymentRow {
        id: id.to_string(),
        tenant_id: tenant.to_string(),
        room_id: Some(tenant.to_string()),
        amount,
        payment_date: date(due),
        paid_at: paid.map(date),
        status,
        description: Some(description.to_string()),
    }
}

/// Five tenants each in their own room, two empty rooms, seven charges.
pub fn seed_snapshot() -> StorageSnapshot {
    use StoragePaymentStatus::{Completed, Failed, Pending};

    const PRIVATE: &[&str] = &["Air Conditioning", "Private Bathroom", "Desk"];
    const PRIVATE_FRIDGE: &[&str] = &[
        "Air Conditioning",
        "Private Bathroom",
        "Desk",
        "Mini Fridge",
    ];
    const SHARED: &[&str] = &["Air Conditioning", "Shared Bathroom", "Desk"];
    const SHARED_FRIDGE: &[&str] = &[
        "Air Conditioning",
        "Shared Bathroom",
        "Desk",
        "Mini Fridge",
    ];
    const SUITE: &[&str] = &[
        "Air Conditioning",
        "Private Bathroom",
        "Desk",
        "Mini Fridge",
        "Balcony",
    ];
    const PENTHOUSE: &[&str] = &[
        "Air Conditioning",
        "Private Bathroom",
        "Desk",
        "Mini Fridge",
        "Balcony",
        "Kitchenette",
    ];

    StorageSnapshot {
        tenants: vec![
            tenant(
                "1",
                "John Doe",
                "john.doe@example.com",
                "123-456-7890",
                "123 Main St",
                "234-567-8901",
                "2023-01-15",
            ),
            tenant(
                "2",
                "Jane Smith",
                "jane.smith@example.com",
                "123-456-7891",
                "456 Oak St",
                "234-567-8902",
                "2023-02-10",
            ),
            tenant(
                "3",
                "Bob Johnson",
                "bob.johnson@example.com",
                "123-456-7892",
                "789 Pine St",
                "234-567-8903",
                "2023-03-05",
            ),
            tenant(
                "4",
                "Alice Williams",
                "alice.williams@example.com",
                "123-456-7893",
                "101 Elm St",
                "234-567-8904",
                "2023-04-20",
            ),
            tenant(
                "5",
                "Charlie Brown",
                "charlie.brown@example.com",
                "123-456-7894",
                "202 Maple St",
                "234-567-8905",
                "2023-05-12",
            ),
        ],
        rooms: vec![
            room("1", "101", 1, 500, PRIVATE, &["1"]),
            room("2", "102", 1, 550, PRIVATE_FRIDGE, &["2"]),
            room("3", "201", 2, 800, SHARED, &["3"]),
            room("4", "202", 2, 850, SHARED_FRIDGE, &["4"]),
            room("5", "301", 3, 1200, SUITE, &["5"]),
            room("6", "302", 3, 1250, SUITE, &[]),
            room("7", "401", 4, 1600, PENTHOUSE, &[]),
        ],
        payments: vec![
            payment("1", "1", 500, "2023-10-01", Some("2023-09-29"), Completed, "October 2023 Rent"),
            payment("2", "2", 550, "2023-10-01", Some("2023-09-30"), Completed, "October 2023 Rent"),
            payment("3", "3", 800, "2023-10-01", None, Pending, "October 2023 Rent"),
            payment("4", "4", 850, "2023-09-01", None, Failed, "September 2023 Rent"),
            payment("5", "5", 1200, "2023-10-01", Some("2023-09-28"), Completed, "October 2023 Rent"),
            payment("6", "1", 500, "2023-09-01", Some("2023-08-30"), Completed, "September 2023 Rent"),
            payment("7", "2", 550, "2023-09-01", Some("2023-08-31"), Completed, "September 2023 Rent"),
        ],
    }
}
