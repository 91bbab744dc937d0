use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::UNSPECIFIED_STR;

/// Direction of media flow over a transport.
///
/// A sending transport carries producers and data producers; a receiving
/// one carries consumers and data consumers.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportDirection {
    /// Direction is not specified. Transports refuse it.
    #[default]
    Unspecified,

    #[serde(rename = "send")]
    Send,

    #[serde(rename = "recv")]
    Recv,
}

const TRANSPORT_DIRECTION_SEND_STR: &str = "send";
const TRANSPORT_DIRECTION_RECV_STR: &str = "recv";

impl From<&str> for TransportDirection {
    fn from(raw: &str) -> Self {
        match raw {
            TRANSPORT_DIRECTION_SEND_STR => TransportDirection::Send,
            TRANSPORT_DIRECTION_RECV_STR => TransportDirection::Recv,
            _ => TransportDirection::Unspecified,
        }
    }
}

impl fmt::Display for TransportDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            TransportDirection::Send => TRANSPORT_DIRECTION_SEND_STR,
            TransportDirection::Recv => TRANSPORT_DIRECTION_RECV_STR,
            TransportDirection::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}
