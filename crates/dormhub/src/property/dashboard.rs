use std::cmp::Reverse;

use serde::Serialize;

use super::domain::{Payment, Room, RoomStatus, Tenant};
use super::status::PaymentStatus;

/// Number of entries shown in each dashboard payment feed.
pub const FEED_LENGTH: usize = 5;

/// Headline figures for the operator dashboard. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_tenants: usize,
    pub available_rooms: usize,
    pub occupied_rooms: usize,
    pub pending_payments: usize,
    pub overdue_payments: usize,
    pub total_revenue: u64,
}

impl DashboardStats {
    pub fn compute(tenants: &[Tenant], rooms: &[Room], payments: &[Payment]) -> Self {
        let occupied_rooms = rooms
            .iter()
            .filter(|room| room.status() == RoomStatus::Occupied)
            .count();

        let mut stats = Self {
            total_tenants: tenants.len(),
            available_rooms: rooms.len() - occupied_rooms,
            occupied_rooms,
            ..Self::default()
        };

        for payment in payments {
            match payment.status {
                PaymentStatus::Pending => stats.pending_payments += 1,
                PaymentStatus::Overdue => stats.overdue_payments += 1,
                PaymentStatus::Paid => stats.total_revenue += u64::from(payment.amount),
            }
        }

        stats
    }
}

/// Latest charges first, by due date.
pub fn recent_payments(payments: &[Payment], limit: usize) -> Vec<Payment> {
    let mut sorted = payments.to_vec();
    sorted.sort_by_key(|payment| Reverse(payment.due_date));
    sorted.truncate(limit);
    sorted
}

/// Unsettled charges, earliest due first.
pub fn upcoming_payments(payments: &[Payment], limit: usize) -> Vec<Payment> {
    let mut unpaid: Vec<Payment> = payments
        .iter()
        .filter(|payment| !payment.is_settled())
        .cloned()
        .collect();
    unpaid.sort_by_key(|payment| payment.due_date);
    unpaid.truncate(limit);
    unpaid
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub recent_payments: Vec<Payment>,
    pub upcoming_payments: Vec<Payment>,
}

impl DashboardView {
    pub fn build(tenants: &[Tenant], rooms: &[Room], payments: &[Payment]) -> Self {
        Self {
            stats: DashboardStats::compute(tenants, rooms, payments),
            recent_payments: recent_payments(payments, FEED_LENGTH),
            upcoming_payments: upcoming_payments(payments, FEED_LENGTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::domain::{PaymentId, RoomId, TenantId};
    use chrono::NaiveDate;

    fn payment(id: &str, status: PaymentStatus, amount: u32, due_day: u32) -> Payment {
        let due_date = NaiveDate::from_ymd_opt(2024, 5, due_day).expect("valid date");
        Payment {
            id: PaymentId::new(id),
            tenant_id: TenantId::new("t1"),
            room_id: None,
            amount,
            due_date,
            paid_date: status.is_paid().then_some(due_date),
            status,
            description: String::new(),
        }
    }

    #[test]
    fn empty_collections_produce_zeroes() {
        assert_eq!(DashboardStats::compute(&[], &[], &[]), DashboardStats::default());
    }

    #[test]
    fn feeds_order_by_due_date() {
        let payments = vec![
            payment("a", PaymentStatus::Paid, 100, 3),
            payment("b", PaymentStatus::Pending, 100, 9),
            payment("c", PaymentStatus::Overdue, 100, 1),
            payment("d", PaymentStatus::Pending, 100, 5),
        ];

        let recent: Vec<_> = recent_payments(&payments, 2)
            .into_iter()
            .map(|p| p.id.0)
            .collect();
        assert_eq!(recent, vec!["b", "d"]);

        let upcoming: Vec<_> = upcoming_payments(&payments, 5)
            .into_iter()
            .map(|p| p.id.0)
            .collect();
        assert_eq!(upcoming, vec!["c", "d", "b"]);
    }

    #[test]
    fn room_partition_follows_membership() {
        let room = |id: &str, tenants: &[&str]| Room {
            id: RoomId::new(id),
            number: id.to_string(),
            floor: "1".to_string(),
            capacity: 2,
            price: 500,
            amenities: Vec::new(),
            images: Vec::new(),
            tenant_ids: tenants.iter().map(|t| TenantId::new(*t)).collect(),
            dorm_id: None,
        };
        let stats = DashboardStats::compute(&[], &[room("1", &["a"]), room("2", &[])], &[]);
        assert_eq!(stats.occupied_rooms, 1);
        assert_eq!(stats.available_rooms, 1);
    }
}
