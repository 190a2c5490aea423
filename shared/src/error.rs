use thiserror::Error;

use netvar_serde::SerdeErr;

use crate::ActorId;

/// Errors surfaced by replicated fields and the sync scheduler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// A local write was rejected; the field is unchanged
    #[error("{actor} may not write this field (authority: {authority}, owner: {owner:?})")]
    PermissionDenied {
        actor: ActorId,
        authority: ActorId,
        owner: Option<ActorId>,
    },

    /// A list mutation addressed an index that does not exist; no delta was produced
    #[error("Index {index} is out of range for a list of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    /// Incoming data addressed a field the attached entity does not declare
    #[error("Unknown field {field_id} (entity declares {field_count} field(s))")]
    UnknownField { field_id: u64, field_count: usize },

    /// The first byte of an incoming packet is not a known packet type
    #[error("Unknown packet type {value}")]
    UnknownPacketType { value: u8 },

    /// Field ids are 16 bits wide on the wire
    #[error("Entity declares {count} fields, more than a FieldId can address")]
    TooManyFields { count: usize },

    /// The scheduler has no entity attached
    #[error("No entity is attached to this SyncScheduler")]
    NotAttached,

    /// Encoding or decoding failed
    #[error(transparent)]
    Serde(#[from] SerdeErr),
}
