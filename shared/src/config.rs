use std::default::Default;

/// Contains Config properties which will be used by a [`SyncScheduler`].
///
/// Each scheduler (one per entity per channel) carries its own copy, so two
/// channels may trust their peers differently. Both ends of a channel must
/// agree on `length_safety`, since it changes the wire layout.
///
/// [`SyncScheduler`]: crate::SyncScheduler
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Length-prefix every field payload and range-check it on read. With
    /// this off a field that fails to decode abandons the rest of its packet.
    pub length_safety: bool,
    /// Packets waiting for `take_outgoing` before the oldest is dropped
    pub max_queued_packets: usize,
    /// Flushes to wait before repeating an unanswered resync request
    pub resync_retry_interval: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            length_safety: true,
            max_queued_packets: 64,
            resync_retry_interval: 30,
        }
    }
}
