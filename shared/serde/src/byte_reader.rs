use crate::SerdeErr;

/// A cursor over borrowed incoming bytes
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let byte = *self
            .buffer
            .get(self.cursor)
            .ok_or(SerdeErr::TruncatedData {
                needed: 1,
                remaining: 0,
            })?;
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'b [u8], SerdeErr> {
        let remaining = self.remaining();
        if length > remaining {
            return Err(SerdeErr::TruncatedData {
                needed: length,
                remaining,
            });
        }
        let start = self.cursor;
        self.cursor += length;
        Ok(&self.buffer[start..self.cursor])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let mut output = [0u8; N];
        output.copy_from_slice(self.read_bytes(N)?);
        Ok(output)
    }

    /// Splits off a reader over the next `length` bytes, advancing past them
    pub fn sub_reader(&mut self, length: usize) -> Result<ByteReader<'b>, SerdeErr> {
        Ok(ByteReader::new(self.read_bytes(length)?))
    }

    /// Fails with `TrailingData` unless every byte has been consumed
    pub fn finish(&self) -> Result<(), SerdeErr> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(SerdeErr::TrailingData { remaining }),
        }
    }
}
