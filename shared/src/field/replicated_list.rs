use std::ops::Index;

use log::{debug, warn};

use netvar_serde::{read_varint, write_varint, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{
    field::{
        change_log::{ChangeLog, DeltaRecord},
        ApplyOutcome, FieldKind, ReplicatedField, Sender,
    },
    ActorId, ChangeEventBus, ChangeOrigin, ListChanged, PermissionEntry, ReplicationError,
    SubscriptionKey, Version, WritePolicy,
};

/// An ordered replicated collection. Every successful mutation appends exactly
/// one [`DeltaRecord`] to the change log and fires one [`ListChanged`] event.
///
/// The list version counts flushed batches: each non-empty flush bumps it by
/// one, so an observer can tell a lost or reordered batch from the next one.
pub struct ReplicatedList<T: Serde> {
    items: Vec<T>,
    log: ChangeLog<T>,
    version: Version,
    dirty: bool,
    // the current version was flushed from here rather than received
    authored: bool,
    // authority side: next flush sends the whole sequence
    send_full: bool,
    // observer side: local sequence diverged, deltas are ignored until a Full
    awaiting_full: bool,
    flushes_since_request: Option<u32>,
    permission: PermissionEntry,
    events: ChangeEventBus<ListChanged<T>>,
}

impl<T: Serde> ReplicatedList<T> {
    pub fn new(permission: PermissionEntry) -> Self {
        Self::with_items(Vec::new(), permission)
    }

    pub fn with_items(items: Vec<T>, permission: PermissionEntry) -> Self {
        Self {
            items,
            log: ChangeLog::new(),
            version: 0,
            dirty: false,
            authored: false,
            send_full: false,
            awaiting_full: false,
            flushes_since_request: None,
            permission,
            events: ChangeEventBus::new(),
        }
    }

    pub fn authority_only(authority: ActorId) -> Self {
        Self::new(PermissionEntry::authority_only(authority))
    }

    pub fn owner_writable(authority: ActorId, owner: ActorId) -> Self {
        Self::new(PermissionEntry::owner_writable(authority, owner))
    }

    // Reads

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.items.iter().position(|item| item == value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.items.contains(value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Deltas recorded since the last flush
    pub fn pending(&self) -> &ChangeLog<T> {
        &self.log
    }

    /// True while this observer waits for a full snapshot after a desync
    pub fn is_desynced(&self) -> bool {
        self.awaiting_full
    }

    pub fn permission(&self) -> &PermissionEntry {
        &self.permission
    }

    pub fn can_write(&self, actor: ActorId) -> bool {
        self.permission.can_write(actor)
    }

    pub fn delegate(
        &mut self,
        actor: ActorId,
        policy: WritePolicy,
        owner: Option<ActorId>,
    ) -> Result<(), ReplicationError> {
        self.permission.delegate(actor, policy, owner)
    }

    pub fn events(&self) -> &ChangeEventBus<ListChanged<T>> {
        &self.events
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionKey
    where
        F: Fn(&ListChanged<T>) + Send + Sync + 'static,
    {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&self, key: SubscriptionKey) -> bool {
        self.events.unsubscribe(key)
    }

    // Mutations

    pub fn add(&mut self, actor: ActorId, value: T) -> Result<(), ReplicationError> {
        self.author(actor, DeltaRecord::Add { value })
    }

    pub fn insert(
        &mut self,
        actor: ActorId,
        index: usize,
        value: T,
    ) -> Result<(), ReplicationError> {
        self.author(actor, DeltaRecord::Insert { index, value })
    }

    /// Removes and returns the element at `index`
    pub fn remove_at(&mut self, actor: ActorId, index: usize) -> Result<T, ReplicationError> {
        self.permission.check_write(actor)?;
        let removed = self.element(index)?.clone();
        self.author(actor, DeltaRecord::RemoveAt { index })?;
        Ok(removed)
    }

    /// Removes the first element equal to `value`. Returns `Ok(false)`, with
    /// no delta, when there is none.
    pub fn remove(&mut self, actor: ActorId, value: &T) -> Result<bool, ReplicationError> {
        self.permission.check_write(actor)?;
        let Some(index) = self.index_of(value) else {
            return Ok(false);
        };
        self.author(actor, DeltaRecord::RemoveAt { index })?;
        Ok(true)
    }

    /// Replaces the element at `index`, returning the previous one
    pub fn set(&mut self, actor: ActorId, index: usize, value: T) -> Result<T, ReplicationError> {
        self.permission.check_write(actor)?;
        let previous = self.element(index)?.clone();
        self.author(
            actor,
            DeltaRecord::Set {
                index,
                previous: previous.clone(),
                value,
            },
        )?;
        Ok(previous)
    }

    pub fn clear(&mut self, actor: ActorId) -> Result<(), ReplicationError> {
        self.author(actor, DeltaRecord::Clear)
    }

    fn element(&self, index: usize) -> Result<&T, ReplicationError> {
        self.items.get(index).ok_or(ReplicationError::IndexOutOfRange {
            index,
            length: self.items.len(),
        })
    }

    fn author(&mut self, actor: ActorId, record: DeltaRecord<T>) -> Result<(), ReplicationError> {
        self.permission.check_write(actor)?;
        let event = record.apply_to(&mut self.items)?;
        self.log.push(record);
        self.dirty = true;
        self.events.notify(&ListChanged {
            event,
            origin: ChangeOrigin::Local,
        });
        Ok(())
    }

    // Incoming

    /// Replays a batch received from a peer, strictly in emission order.
    ///
    /// A batch older than the local version is dropped, and so is a repeat of
    /// the current version unless it starts with `Full`. A batch that skips a
    /// version, or holds a record that no longer fits the local sequence,
    /// marks the list desynced instead of failing: the local sequence stays as
    /// it was until a `Full` record replaces it.
    ///
    /// When both sides flushed the same version, the authority wins. The owner
    /// waits for the authority's `Full`, and the authority sends one.
    pub fn apply_incoming(
        &mut self,
        version: Version,
        log: ChangeLog<T>,
        sender: Sender,
    ) -> ApplyOutcome {
        let starts_full = matches!(log.iter().next(), Some(DeltaRecord::Full { .. }));
        let concurrent = version == self.version && self.authored;
        if version < self.version || (version == self.version && !starts_full && !concurrent) {
            debug!(
                "Dropping stale list batch (incoming version {}, local {})",
                version, self.version
            );
            return ApplyOutcome::Stale;
        }

        if concurrent {
            match sender {
                Sender::Owner => {
                    debug!(
                        "Owner flushed list batch {} concurrently, sending a snapshot",
                        version
                    );
                    // the local sequence becomes the reference for both sides
                    self.awaiting_full = false;
                    self.flushes_since_request = None;
                    self.request_full();
                    return ApplyOutcome::Stale;
                }
                Sender::Authority if !starts_full => {
                    warn!(
                        "Authority flushed list batch {} concurrently, requesting snapshot",
                        version
                    );
                    return self.desync();
                }
                Sender::Authority => {}
            }
        }

        if self.awaiting_full && !starts_full {
            debug!("Ignoring list batch {} while awaiting a snapshot", version);
            return ApplyOutcome::Resync;
        }
        if !starts_full && version != self.version + 1 {
            warn!(
                "List batch gap (incoming version {}, local {}), requesting snapshot",
                version, self.version
            );
            return self.desync();
        }
        if let Err(error) = log.validate(self.items.len()) {
            warn!(
                "List batch {} does not fit local state ({}), requesting snapshot",
                version, error
            );
            return self.desync();
        }

        for record in log.into_records() {
            match record.apply_to(&mut self.items) {
                Ok(event) => self.events.notify(&ListChanged {
                    event,
                    origin: ChangeOrigin::Remote,
                }),
                // validated above
                Err(_) => return self.desync(),
            }
        }
        self.version = version;
        self.authored = false;
        self.awaiting_full = false;
        self.flushes_since_request = None;
        ApplyOutcome::Applied
    }

    fn desync(&mut self) -> ApplyOutcome {
        if !self.awaiting_full {
            self.awaiting_full = true;
            self.flushes_since_request = None;
        }
        ApplyOutcome::Resync
    }

    fn write_batch(
        &self,
        writer: &mut ByteWriter,
        version: Version,
        log: &ChangeLog<T>,
    ) -> Result<(), SerdeErr> {
        write_varint(writer, version)?;
        log.write(writer)
    }

    fn full_log(&self) -> ChangeLog<T> {
        std::iter::once(DeltaRecord::Full {
            items: self.items.clone(),
        })
        .collect()
    }
}

impl<T: Serde> Index<usize> for ReplicatedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a, T: Serde> IntoIterator for &'a ReplicatedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serde> ReplicatedField for ReplicatedList<T> {
    fn kind(&self) -> FieldKind {
        FieldKind::List
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn permission(&self) -> &PermissionEntry {
        &self.permission
    }

    fn write_delta(&mut self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        // bumped even if encoding fails, so observers see the gap and resync
        self.version += 1;
        self.dirty = false;
        self.authored = true;

        let log = if self.send_full {
            self.send_full = false;
            self.log.clear();
            self.full_log()
        } else {
            ChangeLog::from_iter(self.log.take())
        };

        self.write_batch(writer, self.version, &log).inspect_err(|error| {
            warn!("Dropping list batch {}: {}", self.version, error);
        })
    }

    fn write_snapshot(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        self.write_batch(writer, self.version, &self.full_log())
    }

    fn read_delta(
        &mut self,
        reader: &mut ByteReader,
        sender: Sender,
    ) -> Result<ApplyOutcome, SerdeErr> {
        let version = read_varint(reader)?;
        let log = ChangeLog::read(reader)?;
        Ok(self.apply_incoming(version, log, sender))
    }

    fn skip_delta(&self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        read_varint(reader)?;
        ChangeLog::<T>::read(reader).map(drop)
    }

    fn poll_resync_request(&mut self, retry_interval: u32) -> bool {
        if !self.awaiting_full {
            return false;
        }
        match self.flushes_since_request {
            Some(flushes) if flushes + 1 < retry_interval => {
                self.flushes_since_request = Some(flushes + 1);
                false
            }
            _ => {
                self.flushes_since_request = Some(0);
                true
            }
        }
    }

    fn request_full(&mut self) {
        self.send_full = true;
        self.dirty = true;
    }

    fn discard_pending(&mut self) {
        self.log.clear();
        self.send_full = false;
        self.dirty = false;
    }
}
