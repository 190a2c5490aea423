use crate::{ByteWriter, Serde, SerdeErr, SerdeStream};

// Fixed-width numbers are little-endian on the wire.
macro_rules! impl_serde_for_number {
    ($($number:ty),*) => {
        $(
            impl Serde for $number {
                fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
                    match stream {
                        SerdeStream::Writer(writer) => writer.write_bytes(&self.to_le_bytes()),
                        SerdeStream::Reader(reader) => {
                            *self = <$number>::from_le_bytes(reader.read_array()?);
                            Ok(())
                        }
                    }
                }

                fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
                    writer.write_bytes(&self.to_le_bytes())
                }
            }
        )*
    };
}

impl_serde_for_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Serde for bool {
    fn serialize(&mut self, stream: &mut SerdeStream) -> Result<(), SerdeErr> {
        match stream {
            SerdeStream::Writer(writer) => writer.write_byte(u8::from(*self)),
            SerdeStream::Reader(reader) => {
                *self = match reader.read_byte()? {
                    0 => false,
                    1 => true,
                    _ => return Err(SerdeErr::InvalidValue { type_name: "bool" }),
                };
                Ok(())
            }
        }
    }

    fn ser(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        writer.write_byte(u8::from(*self))
    }
}
