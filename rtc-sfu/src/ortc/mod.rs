//! Capability checks applied to RTP and SCTP parameters.
//!
//! The transport consults an [`Ortc`] implementation synchronously: to fill
//! in defaults and reject malformed parameters, to decide whether remote
//! parameters can be received with the local capabilities, and to derive
//! the parameters of the probation consumer.

use log::trace;
use shared::error::{Error, Result};

use crate::constants::{PROBATOR_MID, PROBATOR_PAYLOAD_TYPE, PROBATOR_SSRC};
use crate::rtp_parameters::{
    ExtendedRtpCapabilities, RTCRtcpParameters, RTCRtpCodecParameters, RTCRtpEncodingParameters,
    RTCRtpHeaderExtensionParameters, RTCRtpParameters, RtpCodecKind,
};
use crate::sctp_parameters::SctpStreamParameters;

/// Capability checks consulted by the transport.
///
/// Every method has a structural default, so an implementation only needs
/// to override what it checks differently.
pub trait Ortc: Send + Sync {
    /// Validates `params` in place, filling in defaults.
    fn validate_rtp_parameters(&self, params: &mut RTCRtpParameters) -> Result<()> {
        validate_rtp_parameters(params)
    }

    /// Validates `params` in place, filling in defaults.
    fn validate_sctp_stream_parameters(&self, params: &mut SctpStreamParameters) -> Result<()> {
        validate_sctp_stream_parameters(params)
    }

    /// Whether remote `params` can be received given the local `caps`.
    fn can_receive(
        &self,
        params: &mut RTCRtpParameters,
        caps: &ExtendedRtpCapabilities,
    ) -> Result<bool> {
        can_receive(params, caps)
    }

    /// Derives the probation receiver's parameters from those of a video
    /// consumer.
    fn generate_probator_rtp_parameters(
        &self,
        video_params: &RTCRtpParameters,
    ) -> Result<RTCRtpParameters> {
        generate_probator_rtp_parameters(video_params)
    }
}

/// Structural checks only.
#[derive(Default, Debug, Copy, Clone)]
pub struct DefaultOrtc;

impl Ortc for DefaultOrtc {}

pub fn validate_rtp_parameters(params: &mut RTCRtpParameters) -> Result<()> {
    for codec in &mut params.codecs {
        validate_rtp_codec_parameters(codec)?;
    }

    for ext in &params.header_extensions {
        validate_rtp_header_extension_parameters(ext)?;
    }

    validate_rtcp_parameters(&mut params.rtcp);

    Ok(())
}

fn validate_rtp_codec_parameters(codec: &mut RTCRtpCodecParameters) -> Result<()> {
    let kind = match codec.mime_type.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => codec.kind(),
        _ => RtpCodecKind::Unspecified,
    };

    match kind {
        RtpCodecKind::Audio => {
            if codec.channels.is_none() {
                codec.channels = Some(1);
            }
        }
        RtpCodecKind::Video => codec.channels = None,
        RtpCodecKind::Unspecified => {
            return Err(Error::ErrInvalidRtpParameters(format!(
                "invalid codec.mimeType {:?}",
                codec.mime_type
            )));
        }
    }

    if codec.clock_rate == 0 {
        return Err(Error::ErrInvalidRtpParameters(format!(
            "missing codec.clockRate in {}",
            codec.mime_type
        )));
    }

    if codec.rtcp_feedback.iter().any(|fb| fb.typ.is_empty()) {
        return Err(Error::ErrInvalidRtpParameters(format!(
            "missing rtcpFeedback.type in {}",
            codec.mime_type
        )));
    }

    Ok(())
}

fn validate_rtp_header_extension_parameters(ext: &RTCRtpHeaderExtensionParameters) -> Result<()> {
    if ext.uri.is_empty() {
        return Err(Error::ErrInvalidRtpParameters(
            "missing headerExtension.uri".to_owned(),
        ));
    }

    if ext.id == 0 {
        return Err(Error::ErrInvalidRtpParameters(format!(
            "invalid headerExtension.id for {}",
            ext.uri
        )));
    }

    Ok(())
}

fn validate_rtcp_parameters(rtcp: &mut RTCRtcpParameters) {
    if rtcp.reduced_size.is_none() {
        rtcp.reduced_size = Some(true);
    }
}

pub fn validate_sctp_stream_parameters(params: &mut SctpStreamParameters) -> Result<()> {
    if params.stream_id == u16::MAX {
        return Err(Error::ErrInvalidSctpStreamParameters(format!(
            "invalid streamId {}",
            params.stream_id
        )));
    }

    let partial_reliability =
        params.max_packet_life_time.is_some() || params.max_retransmits.is_some();

    if params.max_packet_life_time.is_some() && params.max_retransmits.is_some() {
        return Err(Error::ErrInvalidSctpStreamParameters(
            "cannot provide both maxPacketLifeTime and maxRetransmits".to_owned(),
        ));
    }

    match params.ordered {
        Some(true) if partial_reliability => {
            return Err(Error::ErrInvalidSctpStreamParameters(
                "cannot be ordered with maxPacketLifeTime or maxRetransmits".to_owned(),
            ));
        }
        None => params.ordered = Some(!partial_reliability),
        _ => {}
    }

    Ok(())
}

pub fn can_receive(params: &mut RTCRtpParameters, caps: &ExtendedRtpCapabilities) -> Result<bool> {
    validate_rtp_parameters(params)?;

    let Some(first_media_codec) = params.codecs.first() else {
        return Ok(false);
    };

    let receivable = caps
        .codecs
        .iter()
        .any(|codec| codec.remote_payload_type == first_media_codec.payload_type);
    trace!(
        "can_receive() payload type {} => {receivable}",
        first_media_codec.payload_type
    );

    Ok(receivable)
}

pub fn generate_probator_rtp_parameters(
    video_params: &RTCRtpParameters,
) -> Result<RTCRtpParameters> {
    let mut video_params = video_params.clone();
    validate_rtp_parameters(&mut video_params)?;

    let Some(codec) = video_params.codecs.first() else {
        return Err(Error::ErrInvalidRtpParameters(
            "missing codecs for probator".to_owned(),
        ));
    };

    Ok(RTCRtpParameters {
        mid: Some(PROBATOR_MID.to_owned()),
        codecs: vec![RTCRtpCodecParameters {
            payload_type: PROBATOR_PAYLOAD_TYPE,
            ..codec.clone()
        }],
        header_extensions: video_params.header_extensions,
        encodings: vec![RTCRtpEncodingParameters {
            ssrc: Some(PROBATOR_SSRC),
            ..Default::default()
        }],
        rtcp: RTCRtcpParameters {
            cname: Some(PROBATOR_MID.to_owned()),
            reduced_size: Some(true),
        },
    })
}
