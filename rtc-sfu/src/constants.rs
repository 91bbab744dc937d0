pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";

/// Track id handed to the handler for the probation receiver.
pub(crate) const PROBATOR_TRACK_ID: &str = "probator";
pub(crate) const PROBATOR_MID: &str = "probator";
pub(crate) const PROBATOR_SSRC: u32 = 1234;
pub(crate) const PROBATOR_PAYLOAD_TYPE: u8 = 127;

/// Capacity of the transport observer channel. Slow subscribers lag and
/// observe `RecvError::Lagged` rather than blocking the transport.
pub(crate) const TRANSPORT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Length of generated track identifiers.
pub(crate) const TRACK_ID_LEN: usize = 32;

/// Keys of the additional handler settings owned by the transport itself.
pub(crate) const RESERVED_ADDITIONAL_SETTINGS: [&str; 5] = [
    "iceServers",
    "iceTransportPolicy",
    "bundlePolicy",
    "rtcpMuxPolicy",
    "sdpSemantics",
];
