// The first byte of every packet a SyncScheduler emits

use netvar_serde::{ByteReader, ByteWriter, SerdeErr};

use crate::ReplicationError;

#[derive(Copy, Debug, Clone, Eq, PartialEq)]
pub enum PacketType {
    // Field entries: dirty deltas after a flush, or full state for a snapshot
    Update,
    // A list of field ids whose observer lost track and wants a Full record
    ResyncRequest,
}

impl PacketType {
    pub fn to_byte(self) -> u8 {
        match self {
            PacketType::Update => 0,
            PacketType::ResyncRequest => 1,
        }
    }

    pub fn from_byte(value: u8) -> Result<Self, ReplicationError> {
        match value {
            0 => Ok(PacketType::Update),
            1 => Ok(PacketType::ResyncRequest),
            // malformed or hostile input, never panic on it
            _ => Err(ReplicationError::UnknownPacketType { value }),
        }
    }

    pub fn write(self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        writer.write_byte(self.to_byte())
    }

    pub fn read(reader: &mut ByteReader) -> Result<Self, ReplicationError> {
        let value = reader.read_byte()?;
        Self::from_byte(value)
    }
}
