use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::UNSPECIFIED_STR;
use crate::rtp_parameters::PayloadType;

/// Priority of an encoding relative to other senders.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-priority/#rtc-priority-type)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCPriorityType {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,
    #[serde(rename = "very-low")]
    VeryLow,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
}

const PRIORITY_TYPE_VERY_LOW_STR: &str = "very-low";
const PRIORITY_TYPE_LOW_STR: &str = "low";
const PRIORITY_TYPE_MEDIUM_STR: &str = "medium";
const PRIORITY_TYPE_HIGH_STR: &str = "high";

impl From<&str> for RTCPriorityType {
    fn from(raw: &str) -> Self {
        match raw {
            PRIORITY_TYPE_VERY_LOW_STR => RTCPriorityType::VeryLow,
            PRIORITY_TYPE_LOW_STR => RTCPriorityType::Low,
            PRIORITY_TYPE_MEDIUM_STR => RTCPriorityType::Medium,
            PRIORITY_TYPE_HIGH_STR => RTCPriorityType::High,
            _ => RTCPriorityType::Unspecified,
        }
    }
}

impl fmt::Display for RTCPriorityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCPriorityType::VeryLow => PRIORITY_TYPE_VERY_LOW_STR,
            RTCPriorityType::Low => PRIORITY_TYPE_LOW_STR,
            RTCPriorityType::Medium => PRIORITY_TYPE_MEDIUM_STR,
            RTCPriorityType::High => PRIORITY_TYPE_HIGH_STR,
            RTCPriorityType::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// RTX parameters for retransmission streams.
///
/// ## Specifications
///
/// * [ORTC](https://draft.ortc.org/#dom-rtcrtprtxparameters)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpRtxParameters {
    /// SSRC for the RTX stream
    pub ssrc: u32,
}

/// RTP encoding parameters for individual encodings in a simulcast or layered stream.
///
/// Every member is optional: callers only set what they care about and the
/// handler fills in the rest.
///
/// ## Specifications
///
/// * [ORTC](http://draft.ortc.org/#dom-rtcrtpencodingparameters)
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCRtpEncodingParameters {
    /// Synchronization source identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssrc: Option<u32>,
    /// RTP stream identifier for simulcast/layered streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_payload_type: Option<PayloadType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtx: Option<RTCRtpRtxParameters>,
    /// Whether this encoding is actively being transmitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Discontinuous transmission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalability_mode: Option<String>,
    /// Resolution scaling factor (must be >= 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_resolution_down_by: Option<f64>,
    /// Maximum bitrate in bits per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bitrate: Option<u32>,
    /// Maximum framerate in frames per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_framerate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_ptime: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RTCPriorityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_priority: Option<RTCPriorityType>,
}

impl RTCRtpEncodingParameters {
    /// Returns the encoding reduced to the members a sender may request.
    ///
    /// `active` defaults to true. Stream identification (`ssrc`, `rid`,
    /// `rtx`, `codec_payload_type`) is assigned by the handler and never
    /// carried over. Non-finite or out of range numeric caps are dropped, as
    /// are unspecified priorities.
    pub fn normalized(&self) -> Self {
        Self {
            active: Some(self.active != Some(false)),
            dtx: self.dtx,
            scalability_mode: self.scalability_mode.clone(),
            scale_resolution_down_by: self
                .scale_resolution_down_by
                .filter(|scale| scale.is_finite() && *scale >= 1.0),
            max_bitrate: self.max_bitrate,
            max_framerate: self
                .max_framerate
                .filter(|framerate| framerate.is_finite() && *framerate >= 0.0),
            adaptive_ptime: self.adaptive_ptime,
            priority: self
                .priority
                .filter(|priority| *priority != RTCPriorityType::Unspecified),
            network_priority: self
                .network_priority
                .filter(|priority| *priority != RTCPriorityType::Unspecified),
            ..Default::default()
        }
    }
}

/// Normalizes the encodings given to `produce()`; an empty list means "let
/// the handler decide" and yields `None`.
pub fn normalize_encodings(
    encodings: &[RTCRtpEncodingParameters],
) -> Option<Vec<RTCRtpEncodingParameters>> {
    if encodings.is_empty() {
        None
    } else {
        Some(encodings.iter().map(|e| e.normalized()).collect())
    }
}
