use netvar_shared::SyncScheduler;

use crate::TestEntity;

/// Panics unless both sides hold identical state for every field
pub fn assert_converged(server: &SyncScheduler<TestEntity>, client: &SyncScheduler<TestEntity>) {
    let (Some(server), Some(client)) = (server.entity(), client.entity()) else {
        panic!("both schedulers must have an entity attached");
    };

    assert_eq!(server.health.get(), client.health.get(), "health diverged");
    assert_eq!(server.name.get(), client.name.get(), "name diverged");
    assert_eq!(
        server.position.get(),
        client.position.get(),
        "position diverged"
    );
    assert_eq!(
        server.inventory.as_slice(),
        client.inventory.as_slice(),
        "inventory diverged"
    );
    assert_eq!(
        server.waypoints.as_slice(),
        client.waypoints.as_slice(),
        "waypoints diverged"
    );
    assert_eq!(
        server.notes.as_slice(),
        client.notes.as_slice(),
        "notes diverged"
    );
    for (name, desynced) in [
        ("inventory", client.inventory.is_desynced()),
        ("waypoints", client.waypoints.is_desynced()),
        ("notes", client.notes.is_desynced()),
    ] {
        assert!(!desynced, "client {} still awaiting a snapshot", name);
    }
}
