use chrono::NaiveDate;
use dormhub::property::{
    DashboardStats, DashboardView, Payment, PaymentId, PaymentStatus, Room, RoomId, Tenant,
    TenantId, FEED_LENGTH,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn tenant(id: &str, room: Option<&str>) -> Tenant {
    Tenant {
        id: TenantId::new(id),
        name: format!("Tenant {id}"),
        email: format!("tenant{id}@example.com"),
        phone: String::new(),
        address: String::new(),
        emergency_contact: String::new(),
        date_joined: date(2023, 1, 1),
        room_id: room.map(RoomId::new),
        user_id: None,
    }
}

fn room(id: &str, capacity: u32, tenants: &[&str]) -> Room {
    Room {
        id: RoomId::new(id),
        number: format!("{id}01"),
        floor: id.to_string(),
        capacity,
        price: 500,
        amenities: Vec::new(),
        images: Vec::new(),
        tenant_ids: tenants.iter().copied().map(TenantId::new).collect(),
        dorm_id: None,
    }
}

fn payment(id: &str, status: PaymentStatus, amount: u32, due: NaiveDate) -> Payment {
    Payment {
        id: PaymentId::new(id),
        tenant_id: TenantId::new("1"),
        room_id: None,
        amount,
        due_date: due,
        paid_date: status.is_paid().then_some(due),
        status,
        description: String::new(),
    }
}

fn five_tenants_three_occupied() -> (Vec<Tenant>, Vec<Room>) {
    let tenants = vec![
        tenant("1", Some("1")),
        tenant("2", Some("2")),
        tenant("3", Some("3")),
        tenant("4", Some("3")),
        tenant("5", None),
    ];
    let rooms = vec![
        room("1", 1, &["1"]),
        room("2", 1, &["2"]),
        room("3", 2, &["3", "4"]),
        room("4", 2, &[]),
        room("5", 3, &[]),
    ];
    (tenants, rooms)
}

#[test]
fn stats_count_rooms_and_sum_paid_revenue() {
    let (tenants, rooms) = five_tenants_three_occupied();
    let due = date(2023, 10, 1);
    let payments = vec![
        payment("1", PaymentStatus::Paid, 500, due),
        payment("2", PaymentStatus::Paid, 550, due),
        payment("3", PaymentStatus::Pending, 800, due),
        payment("4", PaymentStatus::Overdue, 850, due),
        payment("5", PaymentStatus::Paid, 1200, due),
    ];

    let stats = DashboardStats::compute(&tenants, &rooms, &payments);

    assert_eq!(
        stats,
        DashboardStats {
            total_tenants: 5,
            available_rooms: 2,
            occupied_rooms: 3,
            pending_payments: 1,
            overdue_payments: 1,
            total_revenue: 2250,
        }
    );
}

#[test]
fn empty_inputs_produce_zeroes() {
    assert_eq!(
        DashboardStats::compute(&[], &[], &[]),
        DashboardStats::default()
    );
}

#[test]
fn revenue_is_not_truncated_to_u32() {
    let payments: Vec<Payment> = (0..3)
        .map(|index| {
            payment(
                &index.to_string(),
                PaymentStatus::Paid,
                u32::MAX,
                date(2023, 1, 1),
            )
        })
        .collect();

    let stats = DashboardStats::compute(&[], &[], &payments);
    assert_eq!(stats.total_revenue, 3 * u64::from(u32::MAX));
}

#[test]
fn view_feeds_are_capped_and_ordered() {
    let (tenants, rooms) = five_tenants_three_occupied();
    let payments: Vec<Payment> = (1..=8)
        .map(|day| {
            let status = if day % 2 == 0 {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            };
            payment(&day.to_string(), status, 100, date(2023, 10, day))
        })
        .collect();

    let view = DashboardView::build(&tenants, &rooms, &payments);

    assert_eq!(view.recent_payments.len(), FEED_LENGTH);
    assert_eq!(view.recent_payments[0].due_date, date(2023, 10, 8));
    assert!(view
        .recent_payments
        .windows(2)
        .all(|pair| pair[0].due_date >= pair[1].due_date));

    assert_eq!(view.upcoming_payments.len(), 4);
    assert!(view.upcoming_payments.iter().all(|payment| !payment.is_settled()));
    assert_eq!(view.upcoming_payments[0].due_date, date(2023, 10, 1));
    assert_eq!(view.stats.pending_payments, 4);
    assert_eq!(view.stats.total_revenue, 400);
}

#[test]
fn stats_serialize_with_camel_case_keys() {
    let (tenants, rooms) = five_tenants_three_occupied();
    let stats = DashboardStats::compute(&tenants, &rooms, &[]);

    let value = serde_json::to_value(stats).expect("stats serialize");
    assert_eq!(value["totalTenants"], 5);
    assert_eq!(value["availableRooms"], 2);
    assert_eq!(value["occupiedRooms"], 3);
    assert_eq!(value["totalRevenue"], 0);
}
