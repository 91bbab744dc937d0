//! The network handler interface.
//!
//! A [`Handler`] performs the actual ICE/DTLS negotiation and owns the local
//! send and receive resources (typically an RTCPeerConnection). The
//! transport drives it exclusively through its serial queue, so a handler
//! never sees two renegotiations at once, and it reports back through the
//! [`HandlerEvents`] it receives in [`Handler::run`].

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use shared::error::{Error, Result};

use crate::data_channel::{DataChannel, RTCDataChannelInit};
use crate::media_stream::MediaStreamTrack;
use crate::producer::ProducerCodecOptions;
use crate::rtp_parameters::{
    ExtendedRtpCapabilities, RTCRtpCodecParameters, RTCRtpEncodingParameters, RTCRtpParameters,
    RtpCodecKind,
};
use crate::sctp_parameters::{SctpParameters, SctpStreamParameters};
use crate::stats::RTCStatsReport;
use crate::transport::TransportInner;
use crate::transport::configuration::RTCIceTransportPolicy;
use crate::transport::direction::TransportDirection;
use crate::transport::dtls::RTCDtlsParameters;
use crate::transport::ice::{RTCIceCandidate, RTCIceParameters, RTCIceServer};
use crate::transport::state::{RTCConnectionState, RTCIceGatheringState};

/// Handler specific sender object, e.g. an RTCRtpSender.
pub type RtpSender = Arc<dyn Any + Send + Sync>;
/// Handler specific receiver object, e.g. an RTCRtpReceiver.
pub type RtpReceiver = Arc<dyn Any + Send + Sync>;

pub struct HandlerRunOptions {
    pub direction: TransportDirection,
    pub ice_parameters: RTCIceParameters,
    pub ice_candidates: Vec<RTCIceCandidate>,
    pub dtls_parameters: RTCDtlsParameters,
    pub sctp_parameters: Option<SctpParameters>,
    pub ice_servers: Vec<RTCIceServer>,
    pub ice_transport_policy: RTCIceTransportPolicy,
    pub additional_settings: Option<serde_json::Value>,
    pub extended_rtp_capabilities: ExtendedRtpCapabilities,
    pub events: HandlerEvents,
}

pub struct HandlerSendOptions {
    pub track: MediaStreamTrack,
    pub encodings: Option<Vec<RTCRtpEncodingParameters>>,
    pub codec_options: Option<ProducerCodecOptions>,
    pub codec: Option<RTCRtpCodecParameters>,
}

pub struct HandlerSendResult {
    pub local_id: String,
    pub rtp_parameters: RTCRtpParameters,
    pub rtp_sender: Option<RtpSender>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerReceiveOptions {
    pub track_id: String,
    pub kind: RtpCodecKind,
    pub rtp_parameters: RTCRtpParameters,
    pub stream_id: Option<String>,
}

pub struct HandlerReceiveResult {
    pub local_id: String,
    pub track: MediaStreamTrack,
    pub rtp_receiver: Option<RtpReceiver>,
}

pub struct HandlerSendDataChannelResult {
    pub data_channel: Arc<dyn DataChannel>,
    pub sctp_stream_parameters: SctpStreamParameters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReceiveDataChannelOptions {
    pub sctp_stream_parameters: SctpStreamParameters,
    pub label: String,
    pub protocol: String,
}

pub struct HandlerReceiveDataChannelResult {
    pub data_channel: Arc<dyn DataChannel>,
}

/// Performs the network side of every transport operation.
///
/// Receive related methods take a batch: consumers created, paused, resumed
/// or closed within the same scheduling tick are handed over in one call so
/// that they cost a single renegotiation. Results of [`Handler::receive`]
/// must match the order of the request list.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> String;

    /// Starts the handler. Called once, synchronously, while the transport
    /// is being created.
    fn run(&self, options: HandlerRunOptions) -> Result<()>;

    /// Tears the handler down. No other method is called afterwards.
    fn close(&self);

    async fn get_transport_stats(&self) -> Result<RTCStatsReport>;

    async fn update_ice_servers(&self, ice_servers: Vec<RTCIceServer>) -> Result<()>;

    async fn restart_ice(&self, ice_parameters: RTCIceParameters) -> Result<()>;

    async fn send(&self, options: HandlerSendOptions) -> Result<HandlerSendResult>;

    async fn stop_sending(&self, local_id: &str) -> Result<()>;

    async fn pause_sending(&self, local_id: &str) -> Result<()>;

    async fn resume_sending(&self, local_id: &str) -> Result<()>;

    async fn replace_track(&self, local_id: &str, track: Option<MediaStreamTrack>) -> Result<()>;

    async fn set_max_spatial_layer(&self, local_id: &str, spatial_layer: u8) -> Result<()>;

    async fn set_rtp_encoding_parameters(
        &self,
        local_id: &str,
        params: RTCRtpEncodingParameters,
    ) -> Result<()>;

    async fn get_sender_stats(&self, local_id: &str) -> Result<RTCStatsReport>;

    async fn send_data_channel(
        &self,
        options: RTCDataChannelInit,
    ) -> Result<HandlerSendDataChannelResult>;

    async fn receive(
        &self,
        options_list: Vec<HandlerReceiveOptions>,
    ) -> Result<Vec<HandlerReceiveResult>>;

    async fn stop_receiving(&self, local_ids: Vec<String>) -> Result<()>;

    async fn pause_receiving(&self, local_ids: Vec<String>) -> Result<()>;

    async fn resume_receiving(&self, local_ids: Vec<String>) -> Result<()>;

    async fn get_receiver_stats(&self, local_id: &str) -> Result<RTCStatsReport>;

    async fn receive_data_channel(
        &self,
        options: HandlerReceiveDataChannelOptions,
    ) -> Result<HandlerReceiveDataChannelResult>;
}

/// The handler's way back into its transport.
///
/// Holds the transport weakly: once the transport is gone every callback
/// is a no-op and [`HandlerEvents::connect`] fails with
/// [`Error::ErrTransportClosed`].
#[derive(Clone)]
pub struct HandlerEvents {
    transport: Weak<TransportInner>,
}

impl HandlerEvents {
    pub(crate) fn new(transport: Weak<TransportInner>) -> Self {
        Self { transport }
    }

    /// Asks the application to signal the local DTLS parameters and waits
    /// for its answer. Must be awaited before the handler starts DTLS.
    pub async fn connect(&self, dtls_parameters: RTCDtlsParameters) -> Result<()> {
        let pending = {
            let transport = self.transport.upgrade().ok_or(Error::ErrTransportClosed)?;
            transport.request_connect(dtls_parameters)?
        };

        pending.await
    }

    pub fn ice_gathering_state_change(&self, ice_gathering_state: RTCIceGatheringState) {
        if let Some(transport) = self.transport.upgrade() {
            transport.on_ice_gathering_state_change(ice_gathering_state);
        }
    }

    pub fn connection_state_change(&self, connection_state: RTCConnectionState) {
        if let Some(transport) = self.transport.upgrade() {
            transport.on_connection_state_change(connection_state);
        }
    }
}

impl fmt::Debug for HandlerEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEvents")
            .field("attached", &(self.transport.strong_count() > 0))
            .finish()
    }
}
