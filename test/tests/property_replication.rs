/// PROPERTY-BASED TESTS: Replication invariants
///
/// Uses proptest to verify replication properties hold across random inputs.
///
/// Key invariants:
/// 1. Replaying a flushed change log on a copy of the pre-mutation sequence
///    reproduces the authoritative sequence
/// 2. An observer fed every flush holds the authoritative sequence
/// 3. Values survive an encode/decode round trip, strings at full capacity
/// 4. Writing an equal value is invisible

use proptest::prelude::*;

use netvar_shared::{
    ByteReader, ByteWriter, ChangeLog, FixedString32, PermissionEntry, ReplicatedField,
    ReplicatedList, ReplicatedValue, ReplicationConfig, Serde,
};
use netvar_test::{attached_pair, tick_and_exchange, LocalLinkPair, TestEntity, SERVER};

#[derive(Clone, Debug)]
enum ListOp {
    Add(u16),
    Insert(usize, u16),
    RemoveAt(usize),
    Set(usize, u16),
    RemoveValue(u16),
    Clear,
}

fn list_op_strategy() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        4 => any::<u16>().prop_map(ListOp::Add),
        2 => (0usize..12, any::<u16>()).prop_map(|(index, value)| ListOp::Insert(index, value)),
        2 => (0usize..12).prop_map(ListOp::RemoveAt),
        2 => (0usize..12, any::<u16>()).prop_map(|(index, value)| ListOp::Set(index, value)),
        1 => (0u16..4).prop_map(ListOp::RemoveValue),
        1 => Just(ListOp::Clear),
    ]
}

// Out-of-range operations are expected to fail without side effects, so
// their results are ignored here.
fn apply_op(list: &mut ReplicatedList<u16>, op: &ListOp) {
    let _ = match op {
        ListOp::Add(value) => list.add(SERVER, *value),
        ListOp::Insert(index, value) => list.insert(SERVER, *index, *value),
        ListOp::RemoveAt(index) => list.remove_at(SERVER, *index).map(|_| ()),
        ListOp::Set(index, value) => list.set(SERVER, *index, *value).map(|_| ()),
        ListOp::RemoveValue(value) => list.remove(SERVER, value).map(|_| ()),
        ListOp::Clear => list.clear(SERVER),
    };
}

fn round_trip<T: Serde + std::fmt::Debug>(value: &T) -> Result<T, TestCaseError> {
    let mut writer = ByteWriter::new();
    value
        .ser(&mut writer)
        .map_err(|error| TestCaseError::fail(error.to_string()))?;
    let bytes = writer.to_bytes();
    let mut reader = ByteReader::new(&bytes);
    let decoded = T::de(&mut reader).map_err(|error| TestCaseError::fail(error.to_string()))?;
    prop_assert!(reader.is_empty(), "decoder left bytes behind");
    Ok(decoded)
}

proptest! {
    /// Test that the recorded change log replays to the same sequence
    #[test]
    fn prop_change_log_replays_exactly(
        initial in prop::collection::vec(0u16..4, 0..8),
        ops in prop::collection::vec(list_op_strategy(), 0..40),
    ) {
        let mut list =
            ReplicatedList::with_items(initial.clone(), PermissionEntry::authority_only(SERVER));
        for op in &ops {
            apply_op(&mut list, op);
        }

        let log: ChangeLog<u16> = list.pending().iter().cloned().collect();
        let mut copy = initial;
        log.replay(&mut copy).map_err(|error| TestCaseError::fail(error.to_string()))?;

        prop_assert_eq!(copy.as_slice(), list.as_slice());
    }

    /// Test that an observer fed every flush ends up identical
    #[test]
    fn prop_observer_tracks_authority(
        batches in prop::collection::vec(prop::collection::vec(list_op_strategy(), 0..10), 1..8),
        length_safety in any::<bool>(),
    ) {
        let config = ReplicationConfig { length_safety, ..ReplicationConfig::default() };
        let (mut server, mut client) = attached_pair(config, TestEntity::new(), TestEntity::new());
        let mut links = LocalLinkPair::perfect();

        for batch in &batches {
            let inventory = &mut server.entity_mut().unwrap().inventory;
            for op in batch {
                apply_op(inventory, op);
            }
            tick_and_exchange(&mut server, &mut client, &mut links)
                .map_err(|error| TestCaseError::fail(error.to_string()))?;

            prop_assert_eq!(
                client.entity().unwrap().inventory.as_slice(),
                server.entity().unwrap().inventory.as_slice()
            );
        }
    }

    /// Test codec round trips across the supported value shapes
    #[test]
    fn prop_codec_round_trips(
        number in any::<u64>(),
        signed in any::<i32>(),
        flag in any::<bool>(),
        text in "[a-z]{0,32}",
        list in prop::collection::vec(any::<u16>(), 0..20),
        maybe in prop::option::of(any::<i64>()),
    ) {
        prop_assert_eq!(round_trip(&number)?, number);
        prop_assert_eq!(round_trip(&signed)?, signed);
        prop_assert_eq!(round_trip(&flag)?, flag);
        prop_assert_eq!(round_trip(&list)?, list);
        prop_assert_eq!(round_trip(&maybe)?, maybe);

        let fixed = FixedString32::try_new(&text)
            .map_err(|error| TestCaseError::fail(error.to_string()))?;
        prop_assert_eq!(round_trip(&fixed)?, fixed);
    }

    /// Test that equal writes never dirty a value or bump its version
    #[test]
    fn prop_equal_write_is_invisible(
        start in any::<u32>(),
        writes in prop::collection::vec(any::<bool>(), 1..10),
    ) {
        let mut value = ReplicatedValue::authority_only(start, SERVER);
        let mut version = 0;
        for changed in writes {
            let next = if changed { value.get().wrapping_add(1) } else { *value.get() };
            let written = value
                .write(SERVER, next)
                .map_err(|error| TestCaseError::fail(error.to_string()))?;
            prop_assert_eq!(written, changed);
            if changed {
                version += 1;
            }
            prop_assert_eq!(value.version(), version);
            prop_assert_eq!(ReplicatedField::is_dirty(&value), version > 0);
        }
    }
}
