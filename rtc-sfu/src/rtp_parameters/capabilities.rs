use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rtp_parameters::{PayloadType, RTCPFeedback, RtpCodecKind};

/// A codec supported by both the local endpoint and the remote SFU, with the
/// payload types each side uses for it.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedRtpCodec {
    pub kind: RtpCodecKind,
    pub mime_type: String,
    pub clock_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    pub local_payload_type: PayloadType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_rtx_payload_type: Option<PayloadType>,
    pub remote_payload_type: PayloadType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_rtx_payload_type: Option<PayloadType>,
    #[serde(default)]
    pub local_parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub remote_parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub rtcp_feedback: Vec<RTCPFeedback>,
}

/// A header extension supported by both sides.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedRtpHeaderExtension {
    pub kind: RtpCodecKind,
    pub uri: String,
    pub send_id: u16,
    pub recv_id: u16,
    #[serde(default)]
    pub encrypt: bool,
}

/// Locally computed intersection of the local and remote RTP capabilities.
///
/// Computing it is the signaling layer's job; the transport only reads it to
/// decide what may be produced and received.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedRtpCapabilities {
    pub codecs: Vec<ExtendedRtpCodec>,
    #[serde(default)]
    pub header_extensions: Vec<ExtendedRtpHeaderExtension>,
}

impl ExtendedRtpCapabilities {
    /// Whether at least one media codec of `kind` is shared with the remote.
    pub fn has_codec_of_kind(&self, kind: RtpCodecKind) -> bool {
        kind != RtpCodecKind::Unspecified && self.codecs.iter().any(|codec| codec.kind == kind)
    }
}

/// Per media kind flags telling whether the remote can receive what we send.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanProduceByKind {
    pub audio: bool,
    pub video: bool,
}

impl CanProduceByKind {
    pub fn can_produce(&self, kind: RtpCodecKind) -> bool {
        match kind {
            RtpCodecKind::Audio => self.audio,
            RtpCodecKind::Video => self.video,
            RtpCodecKind::Unspecified => false,
        }
    }
}

impl From<&ExtendedRtpCapabilities> for CanProduceByKind {
    fn from(caps: &ExtendedRtpCapabilities) -> Self {
        Self {
            audio: caps.has_codec_of_kind(RtpCodecKind::Audio),
            video: caps.has_codec_of_kind(RtpCodecKind::Video),
        }
    }
}
