use std::fmt;

use crate::constants::UNSPECIFIED_STR;

/// Indicates the overall connectivity of a transport.
///
/// The handler moves the transport freely among the non-closed states.
/// [`Closed`](RTCConnectionState::Closed) is only ever entered by closing the
/// transport and is never left.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCConnectionState {
    /// State not specified. Handlers never report it and the transport
    /// ignores it.
    Unspecified,

    /// No connectivity check has started yet. This is the initial state and
    /// the one in which produce/consume calls require a `connect` listener.
    #[default]
    New,

    /// ICE and DTLS are being negotiated.
    Connecting,

    /// Media and data can flow.
    Connected,

    /// Negotiation failed; an ICE restart may recover.
    Failed,

    /// Connectivity was lost and may come back on its own.
    Disconnected,

    /// The transport was closed locally.
    Closed,
}

const CONNECTION_STATE_NEW_STR: &str = "new";
const CONNECTION_STATE_CONNECTING_STR: &str = "connecting";
const CONNECTION_STATE_CONNECTED_STR: &str = "connected";
const CONNECTION_STATE_FAILED_STR: &str = "failed";
const CONNECTION_STATE_DISCONNECTED_STR: &str = "disconnected";
const CONNECTION_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for RTCConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            CONNECTION_STATE_NEW_STR => RTCConnectionState::New,
            CONNECTION_STATE_CONNECTING_STR => RTCConnectionState::Connecting,
            CONNECTION_STATE_CONNECTED_STR => RTCConnectionState::Connected,
            CONNECTION_STATE_FAILED_STR => RTCConnectionState::Failed,
            CONNECTION_STATE_DISCONNECTED_STR => RTCConnectionState::Disconnected,
            CONNECTION_STATE_CLOSED_STR => RTCConnectionState::Closed,
            _ => RTCConnectionState::Unspecified,
        }
    }
}

impl fmt::Display for RTCConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCConnectionState::New => CONNECTION_STATE_NEW_STR,
            RTCConnectionState::Connecting => CONNECTION_STATE_CONNECTING_STR,
            RTCConnectionState::Connected => CONNECTION_STATE_CONNECTED_STR,
            RTCConnectionState::Failed => CONNECTION_STATE_FAILED_STR,
            RTCConnectionState::Disconnected => CONNECTION_STATE_DISCONNECTED_STR,
            RTCConnectionState::Closed => CONNECTION_STATE_CLOSED_STR,
            RTCConnectionState::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}
