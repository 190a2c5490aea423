use crate::{ByteReader, ByteWriter, Serde, SerdeErr, SerdeStream};

/// Longest encoding of a `u64` varint
pub const MAX_VARINT_BYTES: usize = 10;

/// Writes `value` as an unsigned LEB128 varint: seven bits per byte, least
/// significant group first, high bit set while more groups follow.
pub fn write_varint(writer: &mut ByteWriter, mut value: u64) -> Result<(), SerdeErr> {
    loop {
        let group = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            return writer.write_byte(group);
        }
        writer.write_byte(group | 0x80)?;
    }
}

pub fn read_varint(reader: &mut ByteReader) -> Result<u64, SerdeErr> {
    let mut output: u64 = 0;
    for index in 0..MAX_VARINT_BYTES {
        let byte = reader.read_byte()?;
        let group = u64::from(byte & 0x7F);

        // the tenth byte may only carry the single remaining bit
        if index == MAX_VARINT_BYTES - 1 && byte > 1 {
            return Err(SerdeErr::InvalidValue { type_name: "varint" });
        }

        output |= group << (7 * index);
        if byte & 0x80 == 0 {
            return Ok(output);
        }
    }
    Err(SerdeErr::InvalidValue { type_name: "varint" })
}

/// Number of bytes `write_varint` will emit for `value`
pub fn varint_len(value: u64) -> usize {
    let significant_bits = 64 - value.leading_zeros() as usize;
    significant_bits.max(1).div_ceil(7)
}

/// Reads a varint that describes a length or an index
pub fn read_length(reader: &mut ByteReader) -> Result<usize, SerdeErr> {
    usize::try_from(read_varint(reader)?).map_err(|_| SerdeErr::InvalidValue {
        type_name: "length",
    })
}

/// A `u64` that travels as a varint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt(pub u64);

impl VarInt {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<usize> for VarInt {
    fn from(value: usize) -> Self {
        Self(value as u64)
    }
}

impl Serde for VarInt {
    fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
        match stream {
            SerdeStream::Writer(writer) => write_varint(writer, self.0),
            SerdeStream::Reader(reader) => {
                self.0 = read_varint(reader)?;
                Ok(())
            }
        }
    }

    fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        write_varint(writer, self.0)
    }
}
