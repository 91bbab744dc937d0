use std::fmt;

use crate::constants::UNSPECIFIED_STR;

/// Describes the state of the ICE candidate gathering process.
///
/// # Examples
///
/// ```
/// use rtc_sfu::transport::state::RTCIceGatheringState;
///
/// let state = RTCIceGatheringState::Gathering;
/// assert_eq!(state.to_string(), "gathering");
///
/// let parsed: RTCIceGatheringState = "complete".into();
/// assert_eq!(parsed, RTCIceGatheringState::Complete);
/// ```
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCIceGatheringState {
    /// State not specified. Handlers never report it and the transport
    /// ignores it.
    Unspecified,

    /// Gathering has not started. This is the initial state.
    #[default]
    New,

    /// The handler is actively collecting local candidates.
    Gathering,

    /// All candidates have been gathered.
    Complete,
}

const ICE_GATHERING_STATE_NEW_STR: &str = "new";
const ICE_GATHERING_STATE_GATHERING_STR: &str = "gathering";
const ICE_GATHERING_STATE_COMPLETE_STR: &str = "complete";

/// takes a string and converts it to RTCIceGatheringState
impl From<&str> for RTCIceGatheringState {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_GATHERING_STATE_NEW_STR => RTCIceGatheringState::New,
            ICE_GATHERING_STATE_GATHERING_STR => RTCIceGatheringState::Gathering,
            ICE_GATHERING_STATE_COMPLETE_STR => RTCIceGatheringState::Complete,
            _ => RTCIceGatheringState::Unspecified,
        }
    }
}

impl fmt::Display for RTCIceGatheringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCIceGatheringState::New => write!(f, "{ICE_GATHERING_STATE_NEW_STR}"),
            RTCIceGatheringState::Gathering => write!(f, "{ICE_GATHERING_STATE_GATHERING_STR}"),
            RTCIceGatheringState::Complete => {
                write!(f, "{ICE_GATHERING_STATE_COMPLETE_STR}")
            }
            _ => write!(f, "{UNSPECIFIED_STR}"),
        }
    }
}
