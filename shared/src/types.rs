use std::fmt;

/// Index of a field in its container's declaration order
pub type FieldId = u16;

/// Monotonic change counter carried by every replicated field
pub type Version = u64;

/// Identifies one participant (the server or a client) in a replication session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}
