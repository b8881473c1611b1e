use crate::infra::{load_repository, seeded_repository, ConfiguredUploader};
use chrono::{Local, NaiveDate};
use clap::Args;
use dormhub::error::AppError;
use dormhub::property::fixtures::seed_snapshot;
use dormhub::property::{
    audit, DashboardStats, DashboardView, InMemoryPropertyRepository, Payment, PaymentDraft,
    PaymentId, PropertyRepository, PropertyService, RoomId, TenantDraft, TenantId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DashboardArgs {
    /// Storage-schema JSON snapshot to aggregate instead of the seeded dataset
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Print the recent and upcoming payment feeds as well
    #[arg(long)]
    pub(crate) feeds: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Business date used for payment transitions (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Emit single-line JSON instead of pretty-printed output
    #[arg(long)]
    pub(crate) compact: bool,
}

pub(crate) fn run_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let repository = match &args.snapshot {
        Some(path) => load_repository(path)?,
        None => seeded_repository()?,
    };
    let view = dashboard_view(&repository)?;

    println!("DormHub dashboard");
    render_stats(&view.stats);

    if args.feeds {
        println!("\nRecent payments");
        render_payments(&view.recent_payments);
        println!("\nUpcoming payments");
        render_payments(&view.upcoming_payments);
    }

    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let snapshot = seed_snapshot();
    let json = if args.compact {
        serde_json::to_string(&snapshot)?
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    println!("{json}");
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let repository = Arc::new(seeded_repository()?);
    let service = PropertyService::new(repository.clone(), Arc::new(ConfiguredUploader::Disabled));

    println!("DormHub occupancy and rent demo ({today})");
    render_stats(&service.dashboard()?.stats);

    println!("\nRegistering a new tenant");
    let newcomer = service.register_tenant(TenantDraft {
        name: Some("Dana Reyes".to_string()),
        email: Some("dana.reyes@example.com".to_string()),
        phone: Some("123-456-7899".to_string()),
        date_joined: Some(today),
        ..TenantDraft::default()
    })?;
    println!("- {} registered as {}", newcomer.name, newcomer.id);

    let placed = service.place_tenant(&newcomer.id, &RoomId::new("6"))?;
    println!(
        "- placed in room {} ({} of {} places taken)",
        placed.room.number,
        placed.room.occupants(),
        placed.room.capacity
    );

    println!("\nTrying to move Jane Smith into single room 101");
    match service.place_tenant(&TenantId::new("2"), &RoomId::new("1")) {
        Ok(moved) => println!("- unexpectedly moved to {}", moved.room.number),
        Err(err) => println!("- rejected: {err}"),
    }

    println!("\nMoving John Doe to room 401");
    let moved = service.place_tenant(&TenantId::new("1"), &RoomId::new("7"))?;
    let vacated = service.room(&RoomId::new("1"))?;
    println!(
        "- room {} is now {}, room {} is {}",
        moved.room.number,
        moved.room.status().label(),
        vacated.number,
        vacated.status().label()
    );

    println!("\nBilling the new tenant");
    let charge = service.record_payment(
        PaymentDraft {
            tenant_id: Some(newcomer.id.clone()),
            amount: Some(placed.room.price),
            due_date: Some(today),
            description: Some("First month rent".to_string()),
            ..PaymentDraft::default()
        },
        today,
    )?;
    println!(
        "- recorded {} for room {} ({})",
        charge.amount,
        charge.room_id.as_ref().map(RoomId::as_str).unwrap_or("-"),
        charge.status
    );
    let settled = service.settle_payment(&charge.id, today)?;
    println!("- settled on {}", format_date(settled.paid_date));
    let reopened = service.reopen_payment(&charge.id)?;
    println!(
        "- reopened: status {}, paid date {}",
        reopened.status,
        format_date(reopened.paid_date)
    );
    service.settle_payment(&charge.id, today)?;

    let flagged = service.flag_overdue(&PaymentId::new("3"))?;
    println!("- payment {} flagged {}", flagged.id, flagged.status);

    let violations = audit(
        &repository.rooms().map_err(property_error)?,
        &repository.tenants().map_err(property_error)?,
    );
    println!("\nOccupancy audit: {} violation(s)", violations.len());

    println!("\nFinal dashboard");
    render_stats(&service.dashboard()?.stats);

    Ok(())
}

fn dashboard_view(repository: &InMemoryPropertyRepository) -> Result<DashboardView, AppError> {
    let tenants = repository.tenants().map_err(property_error)?;
    let rooms = repository.rooms().map_err(property_error)?;
    let payments = repository.payments().map_err(property_error)?;
    Ok(DashboardView::build(&tenants, &rooms, &payments))
}

fn property_error(err: dormhub::property::RepositoryError) -> AppError {
    AppError::Property(err.into())
}

fn render_stats(stats: &DashboardStats) {
    println!(
        "- {} tenants | {} occupied rooms | {} available rooms",
        stats.total_tenants, stats.occupied_rooms, stats.available_rooms
    );
    println!(
        "- {} pending payments | {} overdue payments | revenue {}",
        stats.pending_payments, stats.overdue_payments, stats.total_revenue
    );
}

fn render_payments(payments: &[Payment]) {
    if payments.is_empty() {
        println!("  (none)");
        return;
    }
    for payment in payments {
        println!(
            "  - {} tenant {} | {} due {} | {}",
            payment.id, payment.tenant_id, payment.amount, payment.due_date, payment.status
        );
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dashboard_view_matches_the_dataset() {
        let repository = seeded_repository().expect("seed data loads");
        let view = dashboard_view(&repository).expect("view builds");
        assert_eq!(view.stats.total_tenants, 5);
        assert_eq!(view.stats.available_rooms, 2);
        assert_eq!(view.stats.total_revenue, 3300);
    }

    #[test]
    fn demo_runs_against_the_seed_data() {
        let today = NaiveDate::from_ymd_opt(2023, 10, 15).expect("valid date");
        run_demo(DemoArgs { today: Some(today) }).expect("demo completes");
    }

    #[test]
    fn export_produces_valid_json() {
        run_export(ExportArgs { compact: true }).expect("export succeeds");
    }

    #[test]
    fn format_date_uses_a_dash_for_missing_dates() {
        assert_eq!(format_date(None), "-");
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2023, 10, 1)),
            "2023-10-01"
        );
    }
}
