use std::collections::VecDeque;

use log::{debug, trace, warn};

use netvar_serde::{read_length, read_varint, write_varint, ByteReader, ByteWriter, SerdeErr};

use crate::{
    sync::{packet_type::PacketType, replicate::Replicate},
    ActorId, ApplyOutcome, FieldId, PermissionEntry, ReplicatedField, ReplicationConfig,
    ReplicationError, Sender,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Clean,
    Dirty,
}

/// What happened to one field entry of an incoming packet
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldOutcome {
    Applied,
    Stale,
    Resync,
    Failed(ReplicationError),
}

impl From<ApplyOutcome> for FieldOutcome {
    fn from(outcome: ApplyOutcome) -> Self {
        match outcome {
            ApplyOutcome::Applied => FieldOutcome::Applied,
            ApplyOutcome::Stale => FieldOutcome::Stale,
            ApplyOutcome::Resync => FieldOutcome::Resync,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Fields whose pending changes went into this flush's update packet
    pub written: Vec<FieldId>,
    /// Fields whose pending changes could not be encoded and were dropped
    pub failed: Vec<(FieldId, ReplicationError)>,
    /// Fields that asked the peer for a full snapshot
    pub resync_requested: Vec<FieldId>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.failed.is_empty() && self.resync_requested.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingReport {
    pub packet_type: PacketType,
    /// Per-field outcomes, in the order the entries appeared
    pub fields: Vec<(FieldId, FieldOutcome)>,
    /// Entries that were skipped without reaching a field
    pub skipped: Vec<ReplicationError>,
    /// Set when the remainder of the packet could not be read
    pub aborted: Option<ReplicationError>,
    /// Fields that will send a full snapshot on the next flush
    pub resync_served: Vec<FieldId>,
}

impl IncomingReport {
    fn new(packet_type: PacketType) -> Self {
        Self {
            packet_type,
            fields: Vec::new(),
            skipped: Vec::new(),
            aborted: None,
            resync_served: Vec::new(),
        }
    }

    /// Outcome of the last entry addressed to `field`
    pub fn outcome(&self, field: FieldId) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .rev()
            .find(|(id, _)| *id == field)
            .map(|(_, outcome)| outcome)
    }

    pub fn applied(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, outcome)| *outcome == FieldOutcome::Applied)
            .count()
    }
}

/// Drives one replicated entity across one channel.
///
/// The authoritative side calls [`flush`](Self::flush) once per tick and hands
/// whatever [`take_outgoing`](Self::take_outgoing) returns to its transport.
/// Observers pass every received buffer to
/// [`feed_incoming`](Self::feed_incoming), and flush too, so that resync
/// requests find their way back. Both ends are the same type.
///
/// Each scheduler knows the actor at the other end of its channel. Incoming
/// entries for fields that actor may not write are rejected with
/// `PermissionDenied` and leave the field untouched.
pub struct SyncScheduler<E: Replicate> {
    config: ReplicationConfig,
    peer: ActorId,
    entity: Option<E>,
    outgoing: VecDeque<Vec<u8>>,
}

impl<E: Replicate> SyncScheduler<E> {
    pub fn new(config: ReplicationConfig, peer: ActorId) -> Self {
        Self {
            config,
            peer,
            entity: None,
            outgoing: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// The actor at the other end of this channel
    pub fn peer(&self) -> ActorId {
        self.peer
    }

    // Lifecycle

    /// Takes ownership of `entity`, returning any previously attached one
    /// (detached first).
    pub fn attach(&mut self, mut entity: E) -> Result<Option<E>, ReplicationError> {
        let count = entity.fields().len();
        if count > usize::from(FieldId::MAX) + 1 {
            return Err(ReplicationError::TooManyFields { count });
        }

        let previous = self.detach();
        entity.on_attach();
        self.entity = Some(entity);
        Ok(previous)
    }

    /// Gives the entity back. Changes not yet flushed, and packets not yet
    /// taken, are dropped.
    pub fn detach(&mut self) -> Option<E> {
        let mut entity = self.entity.take()?;
        for field in entity.fields_mut() {
            field.discard_pending();
        }
        if !self.outgoing.is_empty() {
            debug!("Detaching with {} untaken packet(s)", self.outgoing.len());
            self.outgoing.clear();
        }
        entity.on_detach();
        Some(entity)
    }

    pub fn is_attached(&self) -> bool {
        self.entity.is_some()
    }

    pub fn entity(&self) -> Option<&E> {
        self.entity.as_ref()
    }

    pub fn entity_mut(&mut self) -> Option<&mut E> {
        self.entity.as_mut()
    }

    pub fn state(&self) -> SyncState {
        match &self.entity {
            Some(entity) if entity.fields().iter().any(|field| field.is_dirty()) => {
                SyncState::Dirty
            }
            _ => SyncState::Clean,
        }
    }

    // Outgoing

    /// The tick boundary. Serializes every dirty field into one update packet
    /// and queues it, along with a resync request if any field wants one.
    /// A field that fails to encode is dropped from this packet only.
    pub fn flush(&mut self) -> Result<FlushReport, ReplicationError> {
        let length_safety = self.config.length_safety;
        let retry_interval = self.config.resync_retry_interval;
        let entity = self.entity.as_mut().ok_or(ReplicationError::NotAttached)?;

        let mut report = FlushReport::default();
        let mut update = ByteWriter::new();
        PacketType::Update.write(&mut update)?;

        for (id, field) in numbered(entity.fields_mut()) {
            if field.poll_resync_request(retry_interval) {
                report.resync_requested.push(id);
            }
            if !field.is_dirty() {
                continue;
            }

            let mut payload = ByteWriter::new();
            match field.write_delta(&mut payload) {
                Ok(()) => {
                    write_entry(&mut update, id, payload.as_slice(), length_safety)?;
                    report.written.push(id);
                }
                Err(error) => {
                    warn!("Field {} dropped from flush: {}", id, error);
                    report.failed.push((id, error.into()));
                }
            }
        }

        if !report.resync_requested.is_empty() {
            debug!(
                "Requesting snapshots for fields {:?}",
                report.resync_requested
            );
            let mut request = ByteWriter::new();
            PacketType::ResyncRequest.write(&mut request)?;
            write_varint(&mut request, report.resync_requested.len() as u64)?;
            for id in &report.resync_requested {
                write_varint(&mut request, u64::from(*id))?;
            }
            self.enqueue(request.to_bytes());
        }

        if !report.written.is_empty() {
            trace!(
                "Flushed {} field(s), {} byte(s)",
                report.written.len(),
                update.len()
            );
            self.enqueue(update.to_bytes());
        }

        Ok(report)
    }

    /// Next packet for the transport, oldest first
    pub fn take_outgoing(&mut self) -> Option<Vec<u8>> {
        self.outgoing.pop_front()
    }

    pub fn queued_packets(&self) -> usize {
        self.outgoing.len()
    }

    /// Builds an update packet holding the full state of every field, for an
    /// observer joining late. Pending changes are flushed first so that the
    /// snapshot and the deltas queued after it line up. State that was never
    /// flushed is carried at its current version, which an observer with the
    /// same version still applies.
    pub fn snapshot(&mut self) -> Result<Vec<u8>, ReplicationError> {
        self.flush()?;

        let length_safety = self.config.length_safety;
        let entity = self.entity.as_ref().ok_or(ReplicationError::NotAttached)?;

        let mut packet = ByteWriter::new();
        PacketType::Update.write(&mut packet)?;
        for (id, field) in numbered(entity.fields()) {
            let mut payload = ByteWriter::new();
            if let Err(error) = field.write_snapshot(&mut payload) {
                warn!("Field {} left out of snapshot: {}", id, error);
                continue;
            }
            write_entry(&mut packet, id, payload.as_slice(), length_safety)?;
        }
        Ok(packet.to_bytes())
    }

    fn enqueue(&mut self, packet: Vec<u8>) {
        let limit = self.config.max_queued_packets.max(1);
        while self.outgoing.len() >= limit {
            self.outgoing.pop_front();
            warn!(
                "Outgoing queue is full ({} packets), dropping the oldest",
                limit
            );
        }
        self.outgoing.push_back(packet);
    }

    // Incoming

    /// Applies one received packet. Header errors fail the call; everything
    /// after the header is reported per field.
    pub fn feed_incoming(&mut self, bytes: &[u8]) -> Result<IncomingReport, ReplicationError> {
        let length_safety = self.config.length_safety;
        let peer = self.peer;
        let entity = self.entity.as_mut().ok_or(ReplicationError::NotAttached)?;

        let mut reader = ByteReader::new(bytes);
        let packet_type = PacketType::read(&mut reader)?;
        let mut report = IncomingReport::new(packet_type);
        let mut fields = entity.fields_mut();

        let result = match packet_type {
            PacketType::Update => {
                let mut result = Ok(());
                while result.is_ok() && !reader.is_empty() {
                    result = read_entry(&mut reader, &mut fields, peer, length_safety, &mut report);
                }
                result
            }
            PacketType::ResyncRequest => {
                read_resync_request(&mut reader, &mut fields, &mut report)
            }
        };

        if let Err(error) = result {
            warn!(
                "Abandoning the rest of a {:?} packet: {}",
                packet_type, error
            );
            report.aborted = Some(error);
        }
        Ok(report)
    }
}

fn numbered<F>(fields: Vec<F>) -> impl Iterator<Item = (FieldId, F)> {
    fields
        .into_iter()
        .enumerate()
        .map_while(|(index, field)| {
            FieldId::try_from(index).ok().map(|id| (id, field))
        })
}

fn write_entry(
    writer: &mut ByteWriter,
    id: FieldId,
    payload: &[u8],
    length_safety: bool,
) -> Result<(), SerdeErr> {
    write_varint(writer, u64::from(id))?;
    if length_safety {
        write_varint(writer, payload.len() as u64)?;
    }
    writer.write_bytes(payload)
}

fn lookup(raw_id: u64, field_count: usize) -> Result<FieldId, ReplicationError> {
    FieldId::try_from(raw_id)
        .ok()
        .filter(|id| usize::from(*id) < field_count)
        .ok_or(ReplicationError::UnknownField {
            field_id: raw_id,
            field_count,
        })
}

/// Classifies `peer` against a field's permission, or rejects the entry
fn sender_of(permission: &PermissionEntry, peer: ActorId) -> Result<Sender, ReplicationError> {
    permission.check_write(peer)?;
    if permission.is_authority(peer) {
        Ok(Sender::Authority)
    } else {
        Ok(Sender::Owner)
    }
}

fn read_entry(
    reader: &mut ByteReader,
    fields: &mut [&mut dyn ReplicatedField],
    peer: ActorId,
    length_safety: bool,
    report: &mut IncomingReport,
) -> Result<(), ReplicationError> {
    let raw_id = read_varint(reader)?;
    let found = lookup(raw_id, fields.len());

    if !length_safety {
        let id = found?;
        let Some(field) = fields.get_mut(usize::from(id)) else {
            return Err(ReplicationError::UnknownField {
                field_id: raw_id,
                field_count: fields.len(),
            });
        };
        // a rejected payload is still decoded to find where the next entry starts
        let result = match sender_of(field.permission(), peer) {
            Ok(sender) => field.read_delta(reader, sender).map(FieldOutcome::from),
            Err(denied) => {
                warn!("Rejecting field {} from {}: {}", id, peer, denied);
                field.skip_delta(reader).map(|()| FieldOutcome::Failed(denied))
            }
        };
        return match result {
            Ok(outcome) => {
                report.fields.push((id, outcome));
                Ok(())
            }
            Err(error) => {
                report.fields.push((id, FieldOutcome::Failed(error.clone().into())));
                Err(error.into())
            }
        };
    }

    let length = read_length(reader)?;
    let mut payload = reader.sub_reader(length)?;

    let field = match found {
        Ok(id) => fields.get_mut(usize::from(id)).map(|field| (id, field)),
        Err(error) => {
            warn!("Skipping entry: {}", error);
            report.skipped.push(error);
            None
        }
    };
    let Some((id, field)) = field else {
        return Ok(());
    };

    let sender = match sender_of(field.permission(), peer) {
        Ok(sender) => sender,
        Err(denied) => {
            warn!("Rejecting field {} from {}: {}", id, peer, denied);
            report.fields.push((id, FieldOutcome::Failed(denied)));
            return Ok(());
        }
    };
    match field.read_delta(&mut payload, sender) {
        Ok(outcome) => {
            if let Err(error) = payload.finish() {
                warn!("Field {}: {}", id, error);
            }
            report.fields.push((id, outcome.into()));
        }
        Err(error) => {
            warn!("Skipping field {}: {}", id, error);
            report.fields.push((id, FieldOutcome::Failed(error.into())));
        }
    }
    Ok(())
}

fn read_resync_request(
    reader: &mut ByteReader,
    fields: &mut [&mut dyn ReplicatedField],
    report: &mut IncomingReport,
) -> Result<(), ReplicationError> {
    let count = read_length(reader)?;
    for _ in 0..count {
        let raw_id = read_varint(reader)?;
        let field_count = fields.len();
        match lookup(raw_id, field_count) {
            Ok(id) => {
                if let Some(field) = fields.get_mut(usize::from(id)) {
                    field.request_full();
                    report.resync_served.push(id);
                }
            }
            Err(error) => {
                warn!("Ignoring resync request: {}", error);
                report.skipped.push(error);
            }
        }
    }
    Ok(())
}
