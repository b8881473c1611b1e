use std::sync::Arc;

use dormhub::property::fixtures::seed_snapshot;
use dormhub::property::{
    audit, InMemoryPropertyRepository, OccupancyEngine, OccupancyError, PropertyRepository,
    RoomId, RoomStatus, TenantId,
};

fn engine() -> (
    OccupancyEngine<InMemoryPropertyRepository>,
    Arc<InMemoryPropertyRepository>,
) {
    let repository = Arc::new(
        InMemoryPropertyRepository::from_snapshot(seed_snapshot()).expect("seed data is consistent"),
    );
    (OccupancyEngine::new(repository.clone()), repository)
}

fn consistent(repository: &InMemoryPropertyRepository) -> bool {
    audit(
        &repository.rooms().expect("rooms"),
        &repository.tenants().expect("tenants"),
    )
    .is_empty()
}

#[test]
fn seed_data_is_consistent() {
    let (_, repository) = engine();
    assert!(consistent(&repository));

    let rooms = repository.rooms().expect("rooms");
    let available: Vec<&str> = rooms
        .iter()
        .filter(|room| room.status() == RoomStatus::Available)
        .map(|room| room.number.as_str())
        .collect();
    assert_eq!(available, vec!["302", "401"]);
}

#[test]
fn a_move_out_and_move_in_cycle_keeps_rooms_in_sync() {
    let (engine, repository) = engine();
    let tenant = TenantId::new("2");
    let studio = RoomId::new("2");
    let shared = RoomId::new("4");

    let released = engine.unassign(&tenant).expect("tenant 2 moves out");
    assert_eq!(released.room.status(), RoomStatus::Available);
    assert!(consistent(&repository));

    let placed = engine.assign(&tenant, &shared).expect("room 202 has space");
    assert_eq!(placed.room.tenant_ids.len(), 2);
    assert!(placed.room.is_full());
    assert!(consistent(&repository));

    let moved = engine.reassign(&tenant, &studio).expect("studio is free again");
    assert_eq!(moved.from.id, shared);
    assert_eq!(moved.to.id, studio);
    assert!(consistent(&repository));
}

#[test]
fn a_full_room_turns_everyone_away() {
    let (engine, repository) = engine();
    let suite = RoomId::new("6");

    for tenant in ["1", "2", "3"] {
        engine
            .reassign(&TenantId::new(tenant), &suite)
            .expect("suite has space");
    }
    let err = engine
        .reassign(&TenantId::new("4"), &suite)
        .expect_err("suite holds three");

    assert!(matches!(
        err,
        OccupancyError::CapacityExceeded { capacity: 3, .. }
    ));
    assert!(err.is_rule_violation());
    let room_four = repository
        .room(&RoomId::new("4"))
        .expect("readable")
        .expect("present");
    assert!(room_four.houses(&TenantId::new("4")));
    assert!(consistent(&repository));
}

#[test]
fn deleting_a_tenant_then_their_room() {
    let (engine, repository) = engine();

    engine
        .delete_room(&RoomId::new("5"))
        .expect_err("tenant 5 still lives there");
    engine
        .delete_tenant(&TenantId::new("5"))
        .expect("tenant 5 removed");
    engine
        .delete_room(&RoomId::new("5"))
        .expect("room 301 now empty");

    assert_eq!(repository.tenants().expect("tenants").len(), 4);
    assert_eq!(repository.rooms().expect("rooms").len(), 6);
    assert!(consistent(&repository));
}
