use netvar_serde::{read_length, write_varint, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{ListEvent, ReplicationError};

/// Wire tag of a [`DeltaRecord`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DeltaOpcode {
    Add = 0,
    Insert = 1,
    RemoveAt = 2,
    Set = 3,
    Clear = 4,
    Full = 5,
}

impl DeltaOpcode {
    fn from_byte(byte: u8) -> Result<Self, SerdeErr> {
        match byte {
            0 => Ok(DeltaOpcode::Add),
            1 => Ok(DeltaOpcode::Insert),
            2 => Ok(DeltaOpcode::RemoveAt),
            3 => Ok(DeltaOpcode::Set),
            4 => Ok(DeltaOpcode::Clear),
            5 => Ok(DeltaOpcode::Full),
            // malformed or hostile input, never panic on it
            _ => Err(SerdeErr::InvalidValue {
                type_name: "DeltaOpcode",
            }),
        }
    }
}

/// One mutation of a replicated list, sufficient to reproduce it remotely
#[derive(Clone, Debug, PartialEq)]
pub enum DeltaRecord<T> {
    Add { value: T },
    Insert { index: usize, value: T },
    RemoveAt { index: usize },
    Set { index: usize, previous: T, value: T },
    Clear,
    /// Replace the whole sequence; used for late join and resynchronization
    Full { items: Vec<T> },
}

impl<T: Serde> DeltaRecord<T> {
    pub fn opcode(&self) -> DeltaOpcode {
        match self {
            DeltaRecord::Add { .. } => DeltaOpcode::Add,
            DeltaRecord::Insert { .. } => DeltaOpcode::Insert,
            DeltaRecord::RemoveAt { .. } => DeltaOpcode::RemoveAt,
            DeltaRecord::Set { .. } => DeltaOpcode::Set,
            DeltaRecord::Clear => DeltaOpcode::Clear,
            DeltaRecord::Full { .. } => DeltaOpcode::Full,
        }
    }

    /// Length of a sequence of `length` elements after this record, or
    /// `IndexOutOfRange` if the record does not fit such a sequence
    pub fn resulting_len(&self, length: usize) -> Result<usize, ReplicationError> {
        match self {
            DeltaRecord::Add { .. } => Ok(length + 1),
            DeltaRecord::Insert { index, .. } => {
                // inserting at `length` appends
                if *index > length {
                    return Err(ReplicationError::IndexOutOfRange {
                        index: *index,
                        length,
                    });
                }
                Ok(length + 1)
            }
            DeltaRecord::RemoveAt { index } => {
                check_index(*index, length)?;
                Ok(length - 1)
            }
            DeltaRecord::Set { index, .. } => {
                check_index(*index, length)?;
                Ok(length)
            }
            DeltaRecord::Clear => Ok(0),
            DeltaRecord::Full { items } => Ok(items.len()),
        }
    }

    /// Applies this record to `items`, returning the event that describes it.
    /// On error `items` is untouched.
    pub fn apply_to(&self, items: &mut Vec<T>) -> Result<ListEvent<T>, ReplicationError> {
        self.resulting_len(items.len())?;

        let event = match self {
            DeltaRecord::Add { value } => {
                items.push(value.clone());
                ListEvent::Add {
                    index: items.len() - 1,
                    value: value.clone(),
                }
            }
            DeltaRecord::Insert { index, value } => {
                items.insert(*index, value.clone());
                ListEvent::Insert {
                    index: *index,
                    value: value.clone(),
                }
            }
            DeltaRecord::RemoveAt { index } => ListEvent::RemoveAt {
                index: *index,
                value: items.remove(*index),
            },
            DeltaRecord::Set { index, value, .. } => {
                let previous = std::mem::replace(&mut items[*index], value.clone());
                ListEvent::Set {
                    index: *index,
                    previous,
                    value: value.clone(),
                }
            }
            DeltaRecord::Clear => {
                items.clear();
                ListEvent::Clear
            }
            DeltaRecord::Full { items: snapshot } => {
                items.clone_from(snapshot);
                ListEvent::Full
            }
        };
        Ok(event)
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        writer.write_byte(self.opcode() as u8)?;
        match self {
            DeltaRecord::Add { value } => value.ser(writer),
            DeltaRecord::Insert { index, value } => {
                write_varint(writer, *index as u64)?;
                value.ser(writer)
            }
            DeltaRecord::RemoveAt { index } => write_varint(writer, *index as u64),
            DeltaRecord::Set {
                index,
                previous,
                value,
            } => {
                write_varint(writer, *index as u64)?;
                previous.ser(writer)?;
                value.ser(writer)
            }
            DeltaRecord::Clear => Ok(()),
            DeltaRecord::Full { items } => items.ser(writer),
        }
    }

    pub fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let record = match DeltaOpcode::from_byte(reader.read_byte()?)? {
            DeltaOpcode::Add => DeltaRecord::Add {
                value: T::de(reader)?,
            },
            DeltaOpcode::Insert => DeltaRecord::Insert {
                index: read_length(reader)?,
                value: T::de(reader)?,
            },
            DeltaOpcode::RemoveAt => DeltaRecord::RemoveAt {
                index: read_length(reader)?,
            },
            DeltaOpcode::Set => DeltaRecord::Set {
                index: read_length(reader)?,
                previous: T::de(reader)?,
                value: T::de(reader)?,
            },
            DeltaOpcode::Clear => DeltaRecord::Clear,
            DeltaOpcode::Full => DeltaRecord::Full {
                items: Vec::<T>::de(reader)?,
            },
        };
        Ok(record)
    }
}

fn check_index(index: usize, length: usize) -> Result<(), ReplicationError> {
    if index >= length {
        return Err(ReplicationError::IndexOutOfRange { index, length });
    }
    Ok(())
}

/// Ordered delta records accumulated since the last flush
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeLog<T> {
    records: Vec<DeltaRecord<T>>,
}

impl<T> Default for ChangeLog<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Serde> ChangeLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DeltaRecord<T>) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeltaRecord<T>> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn take(&mut self) -> Vec<DeltaRecord<T>> {
        std::mem::take(&mut self.records)
    }

    pub fn into_records(self) -> Vec<DeltaRecord<T>> {
        self.records
    }

    /// Checks that every record fits the sequence it will meet, starting
    /// from a sequence of `length` elements
    pub fn validate(&self, mut length: usize) -> Result<(), ReplicationError> {
        for record in &self.records {
            length = record.resulting_len(length)?;
        }
        Ok(())
    }

    /// Replays the log, in emission order, onto `items`
    pub fn replay(&self, items: &mut Vec<T>) -> Result<Vec<ListEvent<T>>, ReplicationError> {
        self.validate(items.len())?;
        self.records
            .iter()
            .map(|record| record.apply_to(items))
            .collect()
    }

    /// Delta count followed by each record
    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), SerdeErr> {
        write_varint(writer, self.records.len() as u64)?;
        for record in &self.records {
            record.write(writer)?;
        }
        Ok(())
    }

    pub fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let count = read_length(reader)?;
        let mut records = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            records.push(DeltaRecord::read(reader)?);
        }
        Ok(Self { records })
    }
}

impl<T> FromIterator<DeltaRecord<T>> for ChangeLog<T> {
    fn from_iter<I: IntoIterator<Item = DeltaRecord<T>>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
