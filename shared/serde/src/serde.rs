use crate::{ByteReader, ByteWriter, SerdeErr};

/// Which way a [`SerdeStream`] moves data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// One end of the bidirectional serialization contract. In write mode values
/// are appended to a [`ByteWriter`]; in read mode they are overwritten from a
/// [`ByteReader`] at its cursor.
pub enum SerdeStream<'s, 'b> {
    Writer(&'s mut ByteWriter),
    Reader(&'s mut ByteReader<'b>),
}

impl<'s, 'b> SerdeStream<'s, 'b> {
    pub fn writer(writer: &'s mut ByteWriter) -> Self {
        SerdeStream::Writer(writer)
    }

    pub fn reader(reader: &'s mut ByteReader<'b>) -> Self {
        SerdeStream::Reader(reader)
    }

    pub fn direction(&self) -> Direction {
        match self {
            SerdeStream::Writer(_) => Direction::Write,
            SerdeStream::Reader(_) => Direction::Read,
        }
    }

    pub fn is_reader(&self) -> bool {
        self.direction() == Direction::Read
    }

    pub fn is_writer(&self) -> bool {
        self.direction() == Direction::Write
    }

    /// Serializes a nested value through this same stream
    pub fn serialize<T: Serde>(&mut self, value: &mut T) -> Result<(), SerdeErr> {
        value.serialize(self)
    }
}

/// A type that can be written to and read from a byte stream through one
/// code path.
///
/// Implementors provide `serialize`; `ser` and `de` are derived from it.
/// User-defined structs just forward each of their fields:
///
/// ```
/// # use netvar_serde::{Serde, SerdeErr, SerdeStream};
/// #[derive(Clone, Default, PartialEq, Debug)]
/// struct Health {
///     current: u32,
///     shielded: bool,
/// }
///
/// impl Serde for Health {
///     fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
///         stream.serialize(&mut self.current)?;
///         stream.serialize(&mut self.shielded)
///     }
/// }
/// ```
pub trait Serde: Sized + Clone + PartialEq + Default {
    fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr>;

    /// Append this value to an outgoing buffer
    fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        // `serialize` takes `&mut self` to serve both directions; it never
        // changes the value while writing.
        let mut value = self.clone();
        value.serialize(&mut SerdeStream::Writer(writer))
    }

    /// Read a fresh value from an incoming buffer
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut value = Self::default();
        value.serialize(&mut SerdeStream::Reader(reader))?;
        Ok(value)
    }
}
