use std::{fmt, ops::Deref};

use crate::{
    integer::{read_length, write_varint},
    ByteWriter, Serde, SerdeErr, SerdeStream,
};

pub type FixedString32 = FixedString<32>;
pub type FixedString64 = FixedString<64>;
pub type FixedString128 = FixedString<128>;

/// UTF-8 text bounded to `N` bytes of content.
///
/// The bound is enforced when the string is serialized, never by growing:
/// writing content longer than `N` fails with `CapacityExceeded`, as does
/// reading a declared length longer than `N`.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedString<const N: usize> {
    value: String,
}

impl<const N: usize> FixedString<N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self {
            value: String::new(),
        }
    }

    /// Builds a string, rejecting content that exceeds the capacity up front
    pub fn try_new(value: &str) -> Result<Self, SerdeErr> {
        check_capacity(value.len(), N)?;
        Ok(Self {
            value: value.to_string(),
        })
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Whether the content currently fits the declared capacity
    pub fn fits(&self) -> bool {
        self.value.len() <= N
    }

    pub fn try_push_str(&mut self, value: &str) -> Result<(), SerdeErr> {
        check_capacity(self.value.len() + value.len(), N)?;
        self.value.push_str(value);
        Ok(())
    }
}

fn check_capacity(length: usize, capacity: usize) -> Result<(), SerdeErr> {
    if length > capacity {
        return Err(SerdeErr::CapacityExceeded { length, capacity });
    }
    Ok(())
}

// Unchecked: an oversized value is only rejected once it is written.
impl<const N: usize> From<&str> for FixedString<N> {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl<const N: usize> From<String> for FixedString<N> {
    fn from(value: String) -> Self {
        Self { value }
    }
}

impl<const N: usize> Deref for FixedString<N> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<const N: usize> PartialEq<&str> for FixedString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl<const N: usize> fmt::Debug for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedString<{}>({:?})", N, self.value)
    }
}

impl<const N: usize> fmt::Display for FixedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<const N: usize> Serde for FixedString<N> {
    fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
        match stream {
            SerdeStream::Writer(writer) => self.ser(writer),
            SerdeStream::Reader(reader) => {
                let length = read_length(reader)?;
                check_capacity(length, N)?;
                let bytes = reader.read_bytes(length)?;
                let value = std::str::from_utf8(bytes).map_err(|_| SerdeErr::InvalidValue {
                    type_name: "FixedString",
                })?;
                self.value.clear();
                self.value.push_str(value);
                Ok(())
            }
        }
    }

    fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        check_capacity(self.value.len(), N)?;
        write_varint(writer, self.value.len() as u64)?;
        writer.write_bytes(self.value.as_bytes())
    }
}
