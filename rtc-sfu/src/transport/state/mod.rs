//! Transport state types.
//!
//! A transport tracks two independent state machines, both driven by
//! notifications from its [`Handler`](crate::handler::Handler):
//!
//! - **[`RTCIceGatheringState`]** - local candidate gathering (new, gathering, complete)
//! - **[`RTCConnectionState`]** - overall connectivity (new, connecting, connected, ...)
//!
//! Changes are observed through [`RTCTransportEvent`](crate::transport::RTCTransportEvent)s.
//! A notification repeating the current state is suppressed, and once the
//! transport is closed its connection state stays
//! [`Closed`](RTCConnectionState::Closed).

pub mod connection_state;
pub mod ice_gathering_state;

pub use connection_state::RTCConnectionState;
pub use ice_gathering_state::RTCIceGatheringState;
