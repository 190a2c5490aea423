//! # Netvar Shared
//! Replicates mutable state from one authoritative participant to remote
//! observers: tracked values, delta-encoded lists, write permissions, change
//! events and the per-tick scheduler that moves deltas across the wire.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use netvar_serde::{
    read_length, read_varint, varint_len, write_varint, ByteReader, ByteWriter, Direction,
    FixedString, FixedString128, FixedString32, FixedString64, Serde, SerdeErr, SerdeStream,
    VarInt,
};

mod config;
mod error;
mod events;
mod field;
mod permission;
mod sync;
mod types;

pub use config::ReplicationConfig;
pub use error::ReplicationError;
pub use events::{
    ChangeEventBus, ChangeOrigin, ListChanged, ListEvent, SubscriptionKey, ValueChanged,
};
pub use field::{
    change_log::{ChangeLog, DeltaOpcode, DeltaRecord},
    replicated_list::ReplicatedList,
    replicated_value::ReplicatedValue,
    ApplyOutcome, FieldKind, ReplicatedField, Sender,
};
pub use permission::{PermissionEntry, WritePolicy};
pub use sync::{
    packet_type::PacketType,
    replicate::Replicate,
    scheduler::{FieldOutcome, FlushReport, IncomingReport, SyncScheduler, SyncState},
};
pub use types::{ActorId, FieldId, Version};
