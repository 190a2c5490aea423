/// Integration tests for value replication
///
/// Equal writes produce no traffic, and a reordered older update never
/// overwrites a newer one on the observer.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use netvar_shared::{FixedString32, ReplicationConfig, SyncState};
use netvar_test::{
    assert_converged, attached_pair, tick_and_exchange, LocalLinkPair, Position, TestEntity,
    SERVER,
};

#[test]
fn structured_values_reach_the_observer() {
    let (mut server, mut client) = attached_pair(
        ReplicationConfig::default(),
        TestEntity::new(),
        TestEntity::new(),
    );
    let mut links = LocalLinkPair::perfect();

    let entity = server.entity_mut().unwrap();
    entity.health.write(SERVER, 75).unwrap();
    entity
        .name
        .write(SERVER, FixedString32::try_new("sentinel").unwrap())
        .unwrap();
    entity.position.write(SERVER, Position::new(-4, 12)).unwrap();

    tick_and_exchange(&mut server, &mut client, &mut links).unwrap();

    let observed = client.entity().unwrap();
    assert_eq!(*observed.health.get(), 75);
    assert_eq!(observed.name.get().as_str(), "sentinel");
    assert_eq!(*observed.position.get(), Position::new(-4, 12));
    assert_eq!(observed.health.version(), 1);
    assert_converged(&server, &client);
}

#[test]
fn equal_write_produces_no_traffic() {
    let (mut server, mut client) = attached_pair(
        ReplicationConfig::default(),
        TestEntity::new(),
        TestEntity::new(),
    );
    let mut links = LocalLinkPair::perfect();

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let entity = server.entity_mut().unwrap();
    entity.health.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(entity.health.write(SERVER, 100), Ok(false));
    assert_eq!(entity.health.version(), 0);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(server.state(), SyncState::Clean);

    let report = tick_and_exchange(&mut server, &mut client, &mut links).unwrap();
    assert!(report.to_client.is_empty());
}

#[test]
fn in_place_modification_is_sent() {
    let (mut server, mut client) = attached_pair(
        ReplicationConfig::default(),
        TestEntity::new(),
        TestEntity::new(),
    );
    let mut links = LocalLinkPair::perfect();

    let position = &mut server.entity_mut().unwrap().position;
    assert_eq!(
        position.modify(SERVER, |position| position.x += 3),
        Ok(true)
    );
    assert_eq!(position.modify(SERVER, |_| {}), Ok(false));

    tick_and_exchange(&mut server, &mut client, &mut links).unwrap();
    assert_eq!(
        *client.entity().unwrap().position.get(),
        Position::new(3, 0)
    );
}

#[test]
fn forced_dirty_resends_an_unchanged_value() {
    let (mut server, mut client) = attached_pair(
        ReplicationConfig::default(),
        TestEntity::new(),
        TestEntity::new(),
    );
    let mut links = LocalLinkPair::perfect();

    server.entity_mut().unwrap().health.mark_dirty(SERVER).unwrap();
    let report = tick_and_exchange(&mut server, &mut client, &mut links).unwrap();

    assert_eq!(report.to_client.len(), 1);
    assert_eq!(client.entity().unwrap().health.version(), 1);
    assert_eq!(*client.entity().unwrap().health.get(), 100);
}

#[test]
fn reordered_older_update_is_dropped() {
    let (mut server, mut client) = attached_pair(
        ReplicationConfig::default(),
        TestEntity::new(),
        TestEntity::new(),
    );

    server.entity_mut().unwrap().health.write(SERVER, 90).unwrap();
    server.flush().unwrap();
    let older = server.take_outgoing().unwrap();

    server.entity_mut().unwrap().health.write(SERVER, 80).unwrap();
    server.flush().unwrap();
    let newer = server.take_outgoing().unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    client.entity().unwrap().health.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    client.feed_incoming(&newer).unwrap();
    client.feed_incoming(&older).unwrap();

    let health = &client.entity().unwrap().health;
    assert_eq!(*health.get(), 80);
    assert_eq!(health.version(), 2);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
