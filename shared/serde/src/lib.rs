//! # Netvar Serde
//! Byte-level codec shared by every netvar replicated field.
//!
//! A single [`Serde::serialize`] method both writes and reads a value,
//! depending on the direction of the [`SerdeStream`] it is handed.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod collections;
mod error;
mod fixed_string;
mod integer;
mod number;
mod serde;

pub use byte_reader::ByteReader;
pub use byte_writer::ByteWriter;
pub use error::SerdeErr;
pub use fixed_string::{FixedString, FixedString128, FixedString32, FixedString64};
pub use integer::{read_length, read_varint, varint_len, write_varint, VarInt, MAX_VARINT_BYTES};
pub use serde::{Direction, Serde, SerdeStream};
