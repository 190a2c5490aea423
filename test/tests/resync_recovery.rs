/// Integration tests for convergence over a lossy, reordering link
///
/// Lost or reordered list batches leave a version gap; the observer keeps its
/// last good state, asks for a snapshot, and converges once one arrives.

use netvar_shared::{FieldOutcome, ReplicationConfig};
use netvar_test::{
    assert_converged, attached_pair, exchange_packets_n_times, settle, tick_and_exchange,
    LinkConditioner, LocalLinkPair, Position, TestEntity, SERVER,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn lost_batch_is_recovered_with_a_snapshot() {
    init_logging();
    let (mut server, mut client) = attached_pair(
        ReplicationConfig::default(),
        TestEntity::new(),
        TestEntity::new(),
    );
    let mut links = LocalLinkPair::perfect();

    server.entity_mut().unwrap().inventory.add(SERVER, 1).unwrap();
    links.set_conditioner(LinkConditioner::lossy(1.0));
    tick_and_exchange(&mut server, &mut client, &mut links).unwrap();
    assert_eq!(links.to_client.dropped(), 1);

    links.set_conditioner(LinkConditioner::perfect());
    server.entity_mut().unwrap().inventory.add(SERVER, 2).unwrap();
    let report = tick_and_exchange(&mut server, &mut client, &mut links).unwrap();
    assert_eq!(
        report.to_client[0].outcome(TestEntity::INVENTORY),
        Some(&FieldOutcome::Resync)
    );
    assert!(client.entity().unwrap().inventory.is_empty());

    // the resync request travels on the next tick, the snapshot on the one after
    let report = tick_and_exchange(&mut server, &mut client, &mut links).unwrap();
    assert_eq!(
        report.to_server[0].resync_served,
        vec![TestEntity::INVENTORY]
    );
    tick_and_exchange(&mut server, &mut client, &mut links).unwrap();

    assert_eq!(client.entity().unwrap().inventory.as_slice(), &[1, 2]);
    assert_converged(&server, &client);
}

#[test]
fn lost_resync_request_is_repeated() {
    let config = ReplicationConfig {
        resync_retry_interval: 3,
        ..ReplicationConfig::default()
    };
    let (mut server, mut client) = attached_pair(config, TestEntity::new(), TestEntity::new());
    let mut links = LocalLinkPair::perfect();

    server.entity_mut().unwrap().inventory.add(SERVER, 1).unwrap();
    server.flush().unwrap();
    let _lost = server.take_outgoing();
    server.entity_mut().unwrap().inventory.add(SERVER, 2).unwrap();
    tick_and_exchange(&mut server, &mut client, &mut links).unwrap();

    links.to_server.set_conditioner(LinkConditioner::lossy(1.0));
    tick_and_exchange(&mut server, &mut client, &mut links).unwrap();
    assert_eq!(links.to_server.dropped(), 1);

    links.to_server.set_conditioner(LinkConditioner::perfect());
    let reports = exchange_packets_n_times(&mut server, &mut client, &mut links, 4).unwrap();
    let served: usize = reports
        .iter()
        .flat_map(|report| &report.to_server)
        .map(|incoming| incoming.resync_served.len())
        .sum();
    assert_eq!(served, 1);
    assert_converged(&server, &client);
}

#[test]
fn poor_link_converges_after_settling() {
    init_logging();
    for seed in [1, 7, 42, 1234] {
        let (mut server, mut client) = attached_pair(
            ReplicationConfig::default(),
            TestEntity::new(),
            TestEntity::new(),
        );
        let mut links = LocalLinkPair::conditioned(LinkConditioner::poor(), seed);

        for tick in 0..40u16 {
            let entity = server.entity_mut().unwrap();
            entity.health.write(SERVER, u32::from(tick)).unwrap();
            entity.inventory.add(SERVER, tick).unwrap();
            if tick % 3 == 0 {
                entity.inventory.remove_at(SERVER, 0).unwrap();
            }
            if tick % 5 == 0 {
                entity.inventory.insert(SERVER, 0, tick * 10).unwrap();
            }
            tick_and_exchange(&mut server, &mut client, &mut links).unwrap();
        }

        // one last change per field so every gap becomes visible
        let entity = server.entity_mut().unwrap();
        entity.health.write(SERVER, 1000).unwrap();
        entity.name.mark_dirty(SERVER).unwrap();
        entity.position.write(SERVER, Position::new(9, 9)).unwrap();
        entity.inventory.add(SERVER, 999).unwrap();
        settle(&mut server, &mut client, &mut links).unwrap();

        assert_converged(&server, &client);
    }
}
