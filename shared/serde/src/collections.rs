use crate::{
    integer::{read_length, write_varint},
    ByteWriter, Serde, SerdeErr, SerdeStream,
};

impl<T: Serde> Serde for Vec<T> {
    fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
        match stream {
            SerdeStream::Writer(writer) => self.ser(writer),
            SerdeStream::Reader(reader) => {
                let length = read_length(reader)?;
                // never trust a declared length for preallocation
                let mut output = Vec::with_capacity(length.min(reader.remaining()));
                for _ in 0..length {
                    output.push(T::de(reader)?);
                }
                *self = output;
                Ok(())
            }
        }
    }

    fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        write_varint(writer, self.len() as u64)?;
        for item in self {
            item.ser(writer)?;
        }
        Ok(())
    }
}

impl<T: Serde> Serde for Option<T> {
    fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
        match stream {
            SerdeStream::Writer(writer) => self.ser(writer),
            SerdeStream::Reader(reader) => {
                *self = if bool::de(reader)? {
                    Some(T::de(reader)?)
                } else {
                    None
                };
                Ok(())
            }
        }
    }

    fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        self.is_some().ser(writer)?;
        if let Some(value) = self {
            value.ser(writer)?;
        }
        Ok(())
    }
}
