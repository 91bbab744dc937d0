//! DTLS parameters exchanged through the `connect` request.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::UNSPECIFIED_STR;

/// DtlsRole indicates the role of the DTLS transport.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCDtlsRole {
    #[default]
    Unspecified = 0,

    /// The DTLS role is determined based on the resolved ICE role.
    #[serde(rename = "auto")]
    Auto = 1,

    /// The DTLS client role.
    #[serde(rename = "client")]
    Client = 2,

    /// The DTLS server role.
    #[serde(rename = "server")]
    Server = 3,
}

impl fmt::Display for RTCDtlsRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCDtlsRole::Auto => write!(f, "auto"),
            RTCDtlsRole::Client => write!(f, "client"),
            RTCDtlsRole::Server => write!(f, "server"),
            _ => write!(f, "{UNSPECIFIED_STR}"),
        }
    }
}

/// DTLSFingerprint specifies the hash function algorithm and certificate
/// fingerprint as described in <https://tools.ietf.org/html/rfc4572>.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCDtlsFingerprint {
    /// Algorithm specifies one of the the hash function algorithms defined in
    /// the 'Hash function Textual Names' registry.
    pub algorithm: String,

    /// Value specifies the value of the certificate fingerprint in lowercase
    /// hex string as expressed utilizing the syntax of 'fingerprint' in
    /// <https://tools.ietf.org/html/rfc4572#section-5>.
    pub value: String,
}

/// Local DTLS parameters handed to the application for signaling.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCDtlsParameters {
    #[serde(default)]
    pub role: RTCDtlsRole,
    pub fingerprints: Vec<RTCDtlsFingerprint>,
}
