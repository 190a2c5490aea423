use std::ops::Deref;

use log::{debug, warn};

use netvar_serde::{read_varint, write_varint, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{
    field::{ApplyOutcome, FieldKind, ReplicatedField, Sender},
    ActorId, ChangeEventBus, ChangeOrigin, PermissionEntry, ReplicationError, SubscriptionKey,
    ValueChanged, Version, WritePolicy,
};

/// A single replicated value with dirty tracking, a version counter and
/// equality-based change suppression.
///
/// Writes go through [`write`](Self::write), which checks permission first
/// and does nothing if the new value equals the current one.
pub struct ReplicatedValue<T: Serde> {
    value: T,
    previous: Option<T>,
    version: Version,
    dirty: bool,
    permission: PermissionEntry,
    events: ChangeEventBus<ValueChanged<T>>,
}

impl<T: Serde> ReplicatedValue<T> {
    pub fn new(value: T, permission: PermissionEntry) -> Self {
        Self {
            value,
            previous: None,
            version: 0,
            dirty: false,
            permission,
            events: ChangeEventBus::new(),
        }
    }

    /// A value only `authority` may write
    pub fn authority_only(value: T, authority: ActorId) -> Self {
        Self::new(value, PermissionEntry::authority_only(authority))
    }

    /// A value `authority` and the delegated `owner` may write
    pub fn owner_writable(value: T, authority: ActorId, owner: ActorId) -> Self {
        Self::new(value, PermissionEntry::owner_writable(authority, owner))
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Returns a copy of the current value
    pub fn read(&self) -> T {
        self.value.clone()
    }

    /// The value before the last applied change
    pub fn previous(&self) -> Option<&T> {
        self.previous.as_ref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn permission(&self) -> &PermissionEntry {
        &self.permission
    }

    pub fn can_write(&self, actor: ActorId) -> bool {
        self.permission.can_write(actor)
    }

    /// Redelegate write permission; only the authority may do this
    pub fn delegate(
        &mut self,
        actor: ActorId,
        policy: WritePolicy,
        owner: Option<ActorId>,
    ) -> Result<(), ReplicationError> {
        self.permission.delegate(actor, policy, owner)
    }

    pub fn events(&self) -> &ChangeEventBus<ValueChanged<T>> {
        &self.events
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionKey
    where
        F: Fn(&ValueChanged<T>) + Send + Sync + 'static,
    {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        self.events.unsubscribe(key)
    }

    /// Replaces the value. Returns `Ok(false)` when `value` equals the current
    /// value: nothing is marked dirty, the version stays and no event fires.
    pub fn write(&mut self, actor: ActorId, value: T) -> Result<bool, ReplicationError> {
        self.permission.check_write(actor)?;
        if value == self.value {
            return Ok(false);
        }
        let previous = std::mem::replace(&mut self.value, value);
        self.commit_local(previous);
        Ok(true)
    }

    /// Mutates the value in place, for changes below the top level of a
    /// struct. Suppressed like [`write`](Self::write) if nothing changed.
    pub fn modify<F>(&mut self, actor: ActorId, mutate: F) -> Result<bool, ReplicationError>
    where
        F: FnOnce(&mut T),
    {
        self.permission.check_write(actor)?;
        let previous = self.value.clone();
        mutate(&mut self.value);
        if previous == self.value {
            return Ok(false);
        }
        self.commit_local(previous);
        Ok(true)
    }

    /// Forces the current value to be sent on the next flush even though it
    /// did not change
    pub fn mark_dirty(&mut self, actor: ActorId) -> Result<(), ReplicationError> {
        self.set_dirty(actor, true)
    }

    /// `true` behaves like [`mark_dirty`](Self::mark_dirty); `false` discards
    /// a pending change so it is never sent
    pub fn set_dirty(&mut self, actor: ActorId, dirty: bool) -> Result<(), ReplicationError> {
        self.permission.check_write(actor)?;
        if dirty {
            self.version += 1;
        }
        self.dirty = dirty;
        Ok(())
    }

    fn commit_local(&mut self, previous: T) {
        self.version += 1;
        self.dirty = true;
        self.previous = Some(previous.clone());
        self.events.notify(&ValueChanged {
            previous,
            value: self.value.clone(),
            version: self.version,
            origin: ChangeOrigin::Local,
        });
    }

    /// Applies a value received from a peer. Anything older than the local
    /// version is dropped without an event, which guards against reordered
    /// delivery, and so is a repeat of the current value.
    ///
    /// An equal version carrying a different value means both sides wrote in
    /// the same tick. The authority's value wins: from the authority it is
    /// applied, and from the owner it is dropped while the local value is
    /// re-sent above the owner's version.
    pub fn apply_incoming(&mut self, version: Version, value: T, sender: Sender) -> ApplyOutcome {
        if version < self.version || (version == self.version && value == self.value) {
            debug!(
                "Dropping stale value update (incoming version {}, local {})",
                version, self.version
            );
            return ApplyOutcome::Stale;
        }
        if version == self.version && sender == Sender::Owner {
            debug!(
                "Owner wrote concurrently at version {}, re-sending the authority's value",
                version
            );
            self.version += 1;
            self.dirty = true;
            return ApplyOutcome::Stale;
        }

        let previous = std::mem::replace(&mut self.value, value);
        self.version = version;
        self.previous = Some(previous.clone());
        self.events.notify(&ValueChanged {
            previous,
            value: self.value.clone(),
            version,
            origin: ChangeOrigin::Remote,
        });
        ApplyOutcome::Applied
    }
}

impl<T: Serde> Deref for ReplicatedValue<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: Serde> ReplicatedField for ReplicatedValue<T> {
    fn kind(&self) -> FieldKind {
        FieldKind::Value
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn permission(&self) -> &PermissionEntry {
        &self.permission
    }

    fn write_delta(&mut self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        self.dirty = false;
        self.write_snapshot(writer).inspect_err(|error| {
            warn!(
                "Dropping value change at version {}: {}",
                self.version, error
            );
        })
    }

    fn write_snapshot(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        write_varint(writer, self.version)?;
        self.value.ser(writer)
    }

    fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        sender: Sender,
    ) -> Result<ApplyOutcome, SerdeErr> {
        let version = read_varint(reader)?;
        let value = T::de(reader)?;
        Ok(self.apply_incoming(version, value, sender))
    }

    fn skip_delta(&self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        read_varint(reader)?;
        T::de(reader).map(drop)
    }

    fn discard_pending(&mut self) {
        self.dirty = false;
    }
}
