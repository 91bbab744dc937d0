//! RTP parameter types exchanged between the transport, the handler and the
//! capability checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::UNSPECIFIED_STR;

pub mod capabilities;
pub mod encoding;

pub use capabilities::{
    CanProduceByKind, ExtendedRtpCapabilities, ExtendedRtpCodec, ExtendedRtpHeaderExtension,
};
pub use encoding::{
    RTCPriorityType, RTCRtpEncodingParameters, RTCRtpRtxParameters, normalize_encodings,
};

/// PayloadType identifies the format of the RTP payload.
pub type PayloadType = u8;

/// Media kind carried by a producer or consumer.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RtpCodecKind {
    /// Unspecified or unknown kind
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified = 0,

    #[serde(rename = "audio")]
    Audio = 1,

    #[serde(rename = "video")]
    Video = 2,
}

const RTP_CODEC_KIND_AUDIO_STR: &str = "audio";
const RTP_CODEC_KIND_VIDEO_STR: &str = "video";

impl From<&str> for RtpCodecKind {
    fn from(raw: &str) -> Self {
        match raw {
            RTP_CODEC_KIND_AUDIO_STR => RtpCodecKind::Audio,
            RTP_CODEC_KIND_VIDEO_STR => RtpCodecKind::Video,
            _ => RtpCodecKind::Unspecified,
        }
    }
}

impl fmt::Display for RtpCodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RtpCodecKind::Audio => RTP_CODEC_KIND_AUDIO_STR,
            RtpCodecKind::Video => RTP_CODEC_KIND_VIDEO_STR,
            RtpCodecKind::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// RTCP feedback mechanism negotiated for a codec, e.g. `nack pli`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCPFeedback {
    /// Type is the type of feedback.
    /// see: <https://draft.ortc.org/#dom-rtcrtcpfeedback>
    /// valid: ack, ccm, nack, goog-remb, transport-cc
    #[serde(rename = "type")]
    pub typ: String,

    /// The parameter value depends on the type.
    /// For example, type="nack" parameter="pli" will send Picture Loss Indicator packets.
    #[serde(default)]
    pub parameter: String,
}

/// Codec entry of an [`RTCRtpParameters`].
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCRtpCodecParameters {
    /// MIME type, `audio/opus`, `video/VP8`, ...
    pub mime_type: String,
    pub payload_type: PayloadType,
    pub clock_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    /// Codec specific fmtp parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub rtcp_feedback: Vec<RTCPFeedback>,
}

impl RTCRtpCodecParameters {
    /// Returns the media kind encoded in the MIME type prefix.
    pub fn kind(&self) -> RtpCodecKind {
        self.mime_type
            .split('/')
            .next()
            .map(|prefix| RtpCodecKind::from(prefix.to_lowercase().as_str()))
            .unwrap_or_default()
    }
}

/// Negotiated RTP header extension.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCRtpHeaderExtensionParameters {
    pub uri: String,
    pub id: u16,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

/// RTCP parameters of a sender or receiver.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCRtcpParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduced_size: Option<bool>,
}

/// Complete RTP parameters of one producer or consumer.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCRtpParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<String>,
    pub codecs: Vec<RTCRtpCodecParameters>,
    #[serde(default)]
    pub header_extensions: Vec<RTCRtpHeaderExtensionParameters>,
    #[serde(default)]
    pub encodings: Vec<RTCRtpEncodingParameters>,
    #[serde(default)]
    pub rtcp: RTCRtcpParameters,
}
