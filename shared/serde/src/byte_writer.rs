use log::warn;

use crate::SerdeErr;

/// A growable output buffer. Unlike fixed-capacity values, the buffer itself
/// always tries to grow before reporting `CapacityExceeded`.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    fn reserve(&mut self, additional: usize) -> Result<(), SerdeErr> {
        self.buffer.try_reserve(additional).map_err(|_| {
            warn!(
                "ByteWriter could not grow by {} byte(s) beyond {}",
                additional, self.buffer.len()
            );
            SerdeErr::CapacityExceeded {
                length: self.buffer.len().saturating_add(additional),
                capacity: self.buffer.capacity(),
            }
        })
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), SerdeErr> {
        self.reserve(1)?;
        self.buffer.push(byte);
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerdeErr> {
        self.reserve(bytes.len())?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
