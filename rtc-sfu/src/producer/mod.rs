//! Producers: local media tracks sent over a sending transport.

use std::fmt;
use std::sync::Arc;

use log::{debug, error};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

use crate::app_data::AppData;
use crate::handler::RtpSender;
use crate::media_stream::{MediaStreamTrack, MediaStreamTrackState};
use crate::rtp_parameters::{
    RTCRtpCodecParameters, RTCRtpEncodingParameters, RTCRtpParameters, RtpCodecKind,
};
use crate::stats::RTCStatsReport;
use crate::transport::request::{PendingResponse, Responder};

/// Codec specific knobs applied by the handler when it creates the sender.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerCodecOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opus_stereo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opus_fec: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opus_dtx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opus_max_playback_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opus_max_average_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opus_ptime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_google_start_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_google_max_bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_google_min_bitrate: Option<u32>,
}

/// Options for [`Transport::produce`](crate::transport::Transport::produce).
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    pub track: Option<MediaStreamTrack>,
    /// Simulcast or SVC encodings. Empty lets the handler decide.
    pub encodings: Vec<RTCRtpEncodingParameters>,
    pub codec_options: Option<ProducerCodecOptions>,
    /// Preferred codec among the shared capabilities.
    pub codec: Option<RTCRtpCodecParameters>,
    /// Stop the track when the producer closes or when producing fails.
    pub stop_tracks: bool,
    /// Disable the track while paused.
    pub disable_track_on_pause: bool,
    /// Have the handler stop sending RTP while paused.
    pub zero_rtp_on_pause: bool,
    pub app_data: AppData,
}

impl Default for ProducerOptions {
    fn default() -> Self {
        Self {
            track: None,
            encodings: vec![],
            codec_options: None,
            codec: None,
            stop_tracks: true,
            disable_track_on_pause: true,
            zero_rtp_on_pause: false,
            app_data: AppData::default(),
        }
    }
}

impl ProducerOptions {
    pub fn new(track: MediaStreamTrack) -> Self {
        Self {
            track: Some(track),
            ..Default::default()
        }
    }
}

/// Lifecycle requests a producer sends to its transport.
pub(crate) enum ProducerRequest {
    Close,
    Pause(Responder<()>),
    Resume(Responder<()>),
    ReplaceTrack(Option<MediaStreamTrack>, Responder<()>),
    SetMaxSpatialLayer(u8, Responder<()>),
    SetRtpEncodingParameters(RTCRtpEncodingParameters, Responder<()>),
    GetStats(Responder<RTCStatsReport>),
}

pub(crate) type ProducerListener = Box<dyn Fn(ProducerRequest) + Send + Sync>;

pub(crate) struct ProducerInit {
    pub(crate) id: String,
    pub(crate) local_id: String,
    pub(crate) rtp_sender: Option<RtpSender>,
    pub(crate) track: MediaStreamTrack,
    pub(crate) rtp_parameters: RTCRtpParameters,
    pub(crate) stop_tracks: bool,
    pub(crate) disable_track_on_pause: bool,
    pub(crate) zero_rtp_on_pause: bool,
    pub(crate) app_data: AppData,
}

struct ProducerState {
    closed: bool,
    paused: bool,
    track: Option<MediaStreamTrack>,
    max_spatial_layer: Option<u8>,
    app_data: AppData,
}

struct Inner {
    id: String,
    local_id: String,
    kind: RtpCodecKind,
    rtp_sender: Option<RtpSender>,
    rtp_parameters: RTCRtpParameters,
    stop_tracks: bool,
    disable_track_on_pause: bool,
    zero_rtp_on_pause: bool,
    state: Mutex<ProducerState>,
    listener: ProducerListener,
}

/// A local track sent through a transport.
///
/// Cloning is cheap and every clone refers to the same producer.
#[derive(Clone)]
pub struct Producer {
    inner: Arc<Inner>,
}

impl Producer {
    pub(crate) fn new(init: ProducerInit, listener: ProducerListener) -> Self {
        let paused = init.disable_track_on_pause && !init.track.enabled();

        Self {
            inner: Arc::new(Inner {
                id: init.id,
                local_id: init.local_id,
                kind: init.track.kind(),
                rtp_sender: init.rtp_sender,
                rtp_parameters: init.rtp_parameters,
                stop_tracks: init.stop_tracks,
                disable_track_on_pause: init.disable_track_on_pause,
                zero_rtp_on_pause: init.zero_rtp_on_pause,
                state: Mutex::new(ProducerState {
                    closed: false,
                    paused,
                    track: Some(init.track),
                    max_spatial_layer: None,
                    app_data: init.app_data,
                }),
                listener,
            }),
        }
    }

    /// Producer id, assigned by the SFU.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Handler side id of the sender.
    pub fn local_id(&self) -> &str {
        &self.inner.local_id
    }

    pub fn kind(&self) -> RtpCodecKind {
        self.inner.kind
    }

    pub fn rtp_sender(&self) -> Option<&RtpSender> {
        self.inner.rtp_sender.as_ref()
    }

    pub fn rtp_parameters(&self) -> &RTCRtpParameters {
        &self.inner.rtp_parameters
    }

    pub fn track(&self) -> Option<MediaStreamTrack> {
        self.inner.state.lock().track.clone()
    }

    pub fn closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    pub fn paused(&self) -> bool {
        self.inner.state.lock().paused
    }

    pub fn max_spatial_layer(&self) -> Option<u8> {
        self.inner.state.lock().max_spatial_layer
    }

    pub fn app_data(&self) -> AppData {
        self.inner.state.lock().app_data.clone()
    }

    pub fn set_app_data(&self, app_data: AppData) {
        self.inner.state.lock().app_data = app_data;
    }

    /// Closes the producer and releases its sender on the transport.
    pub fn close(&self) {
        if !self.mark_closed() {
            return;
        }

        debug!("close() producer {}", self.inner.id);
        (self.inner.listener)(ProducerRequest::Close);
    }

    /// The transport closed; the sender is already gone with it.
    pub(crate) fn transport_closed(&self) {
        if self.mark_closed() {
            debug!("transport_closed() producer {}", self.inner.id);
        }
    }

    fn mark_closed(&self) -> bool {
        let track = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
            state.track.take()
        };

        self.destroy_track(track);
        true
    }

    fn destroy_track(&self, track: Option<MediaStreamTrack>) {
        if let Some(track) = track {
            if self.inner.stop_tracks {
                track.stop();
            }
        }
    }

    fn request<T>(&self, build: impl FnOnce(Responder<T>) -> ProducerRequest) -> PendingResponse<T> {
        let (responder, pending) = Responder::channel();
        (self.inner.listener)(build(responder));
        pending
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed() {
            Err(Error::ErrProducerClosed)
        } else {
            Ok(())
        }
    }

    pub async fn get_stats(&self) -> Result<RTCStatsReport> {
        self.ensure_open()?;
        self.request(ProducerRequest::GetStats).await
    }

    /// Pauses the producer. The track is disabled when
    /// `disable_track_on_pause` is set, and the handler stops sending RTP
    /// when `zero_rtp_on_pause` is set.
    pub async fn pause(&self) -> Result<()> {
        let track = {
            let mut state = self.inner.state.lock();
            if state.closed {
                error!("pause() | producer {} closed", self.inner.id);
                return Err(Error::ErrProducerClosed);
            }
            state.paused = true;
            state.track.clone()
        };

        if let Some(track) = track {
            if self.inner.disable_track_on_pause {
                track.set_enabled(false);
            }
        }

        if self.inner.zero_rtp_on_pause {
            self.request(ProducerRequest::Pause).await?;
        }

        Ok(())
    }

    pub async fn resume(&self) -> Result<()> {
        let track = {
            let mut state = self.inner.state.lock();
            if state.closed {
                error!("resume() | producer {} closed", self.inner.id);
                return Err(Error::ErrProducerClosed);
            }
            state.paused = false;
            state.track.clone()
        };

        if let Some(track) = track {
            if self.inner.disable_track_on_pause {
                track.set_enabled(true);
            }
        }

        if self.inner.zero_rtp_on_pause {
            self.request(ProducerRequest::Resume).await?;
        }

        Ok(())
    }

    /// Replaces the track being sent. `None` keeps the sender but sends
    /// nothing.
    pub async fn replace_track(&self, track: Option<MediaStreamTrack>) -> Result<()> {
        let paused = {
            let state = self.inner.state.lock();
            if state.closed {
                if let Some(track) = &track {
                    if self.inner.stop_tracks {
                        track.stop();
                    }
                }
                return Err(Error::ErrProducerClosed);
            }

            if track.is_some() && track == state.track {
                debug!("replace_track() | same track, ignored");
                return Ok(());
            }

            state.paused
        };

        if let Some(track) = &track {
            if track.ready_state() == MediaStreamTrackState::Ended {
                return Err(Error::ErrTrackEnded);
            }
        }

        if !self.inner.zero_rtp_on_pause || !paused {
            let new_track = track.clone();
            self.request(|responder| ProducerRequest::ReplaceTrack(new_track, responder))
                .await?;
        }

        let old_track = {
            let mut state = self.inner.state.lock();
            std::mem::replace(&mut state.track, track.clone())
        };
        self.destroy_track(old_track);

        if let Some(track) = &track {
            if self.inner.disable_track_on_pause {
                track.set_enabled(!paused);
            }
        }

        Ok(())
    }

    /// Limits the highest simulcast/SVC spatial layer sent. Video only.
    pub async fn set_max_spatial_layer(&self, spatial_layer: u8) -> Result<()> {
        {
            let state = self.inner.state.lock();
            if state.closed {
                return Err(Error::ErrProducerClosed);
            }
            if self.inner.kind != RtpCodecKind::Video {
                return Err(Error::ErrNotVideoProducer);
            }
            if state.max_spatial_layer == Some(spatial_layer) {
                return Ok(());
            }
        }

        self.request(|responder| ProducerRequest::SetMaxSpatialLayer(spatial_layer, responder))
            .await?;

        self.inner.state.lock().max_spatial_layer = Some(spatial_layer);
        Ok(())
    }

    pub async fn set_rtp_encoding_parameters(&self, params: RTCRtpEncodingParameters) -> Result<()> {
        self.ensure_open()?;
        self.request(|responder| ProducerRequest::SetRtpEncodingParameters(params, responder))
            .await
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Producer")
            .field("id", &self.inner.id)
            .field("local_id", &self.inner.local_id)
            .field("kind", &self.inner.kind)
            .field("closed", &state.closed)
            .field("paused", &state.paused)
            .finish_non_exhaustive()
    }
}
