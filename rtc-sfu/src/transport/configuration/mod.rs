//! Transport construction options.
//!
//! [`TransportOptions`] carries everything the signaling layer learned about
//! the remote transport plus the locally computed capabilities, and is built
//! with [`TransportOptionsBuilder`]:
//!
//! ```
//! use rtc_sfu::transport::TransportDirection;
//! use rtc_sfu::transport::configuration::TransportOptionsBuilder;
//! use rtc_sfu::transport::ice::RTCIceParameters;
//!
//! let options = TransportOptionsBuilder::new("transport-1", TransportDirection::Send)
//!     .with_ice_parameters(RTCIceParameters {
//!         username_fragment: "ufrag".to_owned(),
//!         password: "pwd".to_owned(),
//!         ice_lite: true,
//!     })
//!     .build();
//!
//! assert!(options.validate().is_ok());
//! ```

pub mod ice_transport_policy;

use std::sync::Arc;

use shared::error::{Error, Result};

use crate::app_data::AppData;
use crate::constants::RESERVED_ADDITIONAL_SETTINGS;
use crate::ortc::{DefaultOrtc, Ortc};
use crate::rtp_parameters::{CanProduceByKind, ExtendedRtpCapabilities};
use crate::sctp_parameters::SctpParameters;
use crate::transport::direction::TransportDirection;
use crate::transport::dtls::RTCDtlsParameters;
use crate::transport::ice::{RTCIceCandidate, RTCIceParameters, RTCIceServer};
pub use ice_transport_policy::RTCIceTransportPolicy;

#[derive(Clone)]
pub struct TransportOptions {
    pub(crate) id: String,
    pub(crate) direction: TransportDirection,
    pub(crate) ice_parameters: RTCIceParameters,
    pub(crate) ice_candidates: Vec<RTCIceCandidate>,
    pub(crate) dtls_parameters: RTCDtlsParameters,
    pub(crate) sctp_parameters: Option<SctpParameters>,
    pub(crate) ice_servers: Vec<RTCIceServer>,
    pub(crate) ice_transport_policy: RTCIceTransportPolicy,
    pub(crate) additional_settings: Option<serde_json::Value>,
    pub(crate) extended_rtp_capabilities: ExtendedRtpCapabilities,
    pub(crate) can_produce_by_kind: Option<CanProduceByKind>,
    pub(crate) app_data: AppData,
    pub(crate) ortc: Arc<dyn Ortc>,
}

impl TransportOptions {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn direction(&self) -> TransportDirection {
        self.direction
    }

    /// Rejects options a transport cannot be created from.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::ErrMissingId);
        }

        if self.direction == TransportDirection::Unspecified {
            return Err(Error::ErrInvalidTransportDirection(
                self.direction.to_string(),
            ));
        }

        if self.ice_parameters.username_fragment.is_empty()
            || self.ice_parameters.password.is_empty()
        {
            return Err(Error::ErrMissingIceParameters);
        }

        Ok(())
    }

    /// Maximum SCTP message size; `None` when the remote has no SCTP.
    pub fn max_sctp_message_size(&self) -> Option<u32> {
        self.sctp_parameters.map(|sctp| sctp.max_message_size)
    }

    /// Explicit can-produce flags, or those derived from the capabilities.
    pub fn can_produce_by_kind(&self) -> CanProduceByKind {
        self.can_produce_by_kind
            .unwrap_or_else(|| CanProduceByKind::from(&self.extended_rtp_capabilities))
    }

    /// ICE servers with the query stripped from STUN urls.
    pub(crate) fn get_ice_servers(&self) -> Vec<RTCIceServer> {
        self.ice_servers.iter().map(RTCIceServer::sanitized).collect()
    }

    /// Additional handler settings without the keys owned by the transport.
    pub(crate) fn get_additional_settings(&self) -> Option<serde_json::Value> {
        let mut settings = self.additional_settings.clone()?;
        if let Some(object) = settings.as_object_mut() {
            for key in RESERVED_ADDITIONAL_SETTINGS {
                object.remove(key);
            }
        }
        Some(settings)
    }
}

pub struct TransportOptionsBuilder {
    id: String,
    direction: TransportDirection,
    ice_parameters: RTCIceParameters,
    ice_candidates: Vec<RTCIceCandidate>,
    dtls_parameters: RTCDtlsParameters,
    sctp_parameters: Option<SctpParameters>,
    ice_servers: Vec<RTCIceServer>,
    ice_transport_policy: RTCIceTransportPolicy,
    additional_settings: Option<serde_json::Value>,
    extended_rtp_capabilities: ExtendedRtpCapabilities,
    can_produce_by_kind: Option<CanProduceByKind>,
    app_data: AppData,
    ortc: Arc<dyn Ortc>,
}

impl TransportOptionsBuilder {
    pub fn new(id: impl Into<String>, direction: TransportDirection) -> Self {
        Self {
            id: id.into(),
            direction,
            ice_parameters: RTCIceParameters::default(),
            ice_candidates: vec![],
            dtls_parameters: RTCDtlsParameters::default(),
            sctp_parameters: None,
            ice_servers: vec![],
            ice_transport_policy: RTCIceTransportPolicy::All,
            additional_settings: None,
            extended_rtp_capabilities: ExtendedRtpCapabilities::default(),
            can_produce_by_kind: None,
            app_data: AppData::default(),
            ortc: Arc::new(DefaultOrtc),
        }
    }

    pub fn with_ice_parameters(mut self, ice_parameters: RTCIceParameters) -> Self {
        self.ice_parameters = ice_parameters;
        self
    }

    pub fn with_ice_candidates(mut self, ice_candidates: Vec<RTCIceCandidate>) -> Self {
        self.ice_candidates = ice_candidates;
        self
    }

    pub fn with_dtls_parameters(mut self, dtls_parameters: RTCDtlsParameters) -> Self {
        self.dtls_parameters = dtls_parameters;
        self
    }

    /// Enables data channels on the transport.
    pub fn with_sctp_parameters(mut self, sctp_parameters: SctpParameters) -> Self {
        self.sctp_parameters = Some(sctp_parameters);
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<RTCIceServer>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_ice_transport_policy(
        mut self,
        ice_transport_policy: RTCIceTransportPolicy,
    ) -> Self {
        self.ice_transport_policy = ice_transport_policy;
        self
    }

    /// Handler specific settings. Keys the transport owns itself
    /// (`iceServers`, `iceTransportPolicy`, `bundlePolicy`, `rtcpMuxPolicy`,
    /// `sdpSemantics`) are dropped before reaching the handler.
    pub fn with_additional_settings(mut self, additional_settings: serde_json::Value) -> Self {
        self.additional_settings = Some(additional_settings);
        self
    }

    pub fn with_extended_rtp_capabilities(
        mut self,
        extended_rtp_capabilities: ExtendedRtpCapabilities,
    ) -> Self {
        self.extended_rtp_capabilities = extended_rtp_capabilities;
        self
    }

    pub fn with_can_produce_by_kind(mut self, can_produce_by_kind: CanProduceByKind) -> Self {
        self.can_produce_by_kind = Some(can_produce_by_kind);
        self
    }

    pub fn with_app_data(mut self, app_data: AppData) -> Self {
        self.app_data = app_data;
        self
    }

    pub fn with_ortc(mut self, ortc: Arc<dyn Ortc>) -> Self {
        self.ortc = ortc;
        self
    }

    pub fn build(self) -> TransportOptions {
        TransportOptions {
            id: self.id,
            direction: self.direction,
            ice_parameters: self.ice_parameters,
            ice_candidates: self.ice_candidates,
            dtls_parameters: self.dtls_parameters,
            sctp_parameters: self.sctp_parameters,
            ice_servers: self.ice_servers,
            ice_transport_policy: self.ice_transport_policy,
            additional_settings: self.additional_settings,
            extended_rtp_capabilities: self.extended_rtp_capabilities,
            can_produce_by_kind: self.can_produce_by_kind,
            app_data: self.app_data,
            ortc: self.ortc,
        }
    }
}
