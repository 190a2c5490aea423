use thiserror::Error;

/// Errors raised while encoding or decoding a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran out of bytes before the value was complete
    #[error("Truncated data: needed {needed} more byte(s) but only {remaining} remain")]
    TruncatedData { needed: usize, remaining: usize },

    /// A bounded value (or the output buffer) cannot hold the requested length
    #[error("Capacity exceeded: length {length} does not fit capacity {capacity}")]
    CapacityExceeded { length: usize, capacity: usize },

    /// The bytes were present but do not describe a valid value of this type
    #[error("Invalid encoding for {type_name}")]
    InvalidValue { type_name: &'static str },

    /// A length-prefixed payload was not fully consumed by its decoder
    #[error("Length-prefixed payload left {remaining} unread byte(s)")]
    TrailingData { remaining: usize },
}
