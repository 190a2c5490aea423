use netvar_serde::{ByteReader, ByteWriter, SerdeErr};

use crate::PermissionEntry;

pub mod change_log;
pub mod replicated_list;
pub mod replicated_value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Value,
    List,
}

/// Result of applying one incoming field payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The payload was newer than local state and was applied
    Applied,
    /// The payload was not newer than local state and was dropped
    Stale,
    /// Local state diverged; the field waits for a full snapshot
    Resync,
}

/// Who sent an incoming payload, relative to the field receiving it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    /// The field's authority. Wins when both sides wrote the same version.
    Authority,
    /// The delegated owner of an owner-writable field
    Owner,
}

/// The type-erased surface the scheduler drives. Implemented by
/// [`ReplicatedValue`] and [`ReplicatedList`].
///
/// [`ReplicatedValue`]: replicated_value::ReplicatedValue
/// [`ReplicatedList`]: replicated_list::ReplicatedList
pub trait ReplicatedField {
    fn kind(&self) -> FieldKind;

    fn is_dirty(&self) -> bool;

    fn permission(&self) -> &PermissionEntry;

    /// Writes pending changes and clears the dirty state, even on error:
    /// a change that cannot be encoded is dropped rather than retried.
    fn write_delta(&mut self, writer: &mut ByteWriter) -> Result<(), SerdeErr>;

    /// Writes the full current state in the same payload format as a delta
    fn write_snapshot(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr>;

    fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        sender: Sender,
    ) -> Result<ApplyOutcome, SerdeErr>;

    /// Reads past one payload without touching local state
    fn skip_delta(&self, reader: &mut ByteReader) -> Result<(), SerdeErr>;

    /// Polled once per flush; true when this field should ask its peer for a
    /// full snapshot
    fn poll_resync_request(&mut self, _retry_interval: u32) -> bool {
        false
    }

    /// The peer asked for a full snapshot of this field
    fn request_full(&mut self) {}

    /// Drops any buffered changes without sending them
    fn discard_pending(&mut self);
}
