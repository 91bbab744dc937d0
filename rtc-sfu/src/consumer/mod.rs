//! Consumers: remote media received over a receiving transport.

use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use shared::error::{Error, Result};

use crate::app_data::AppData;
use crate::handler::RtpReceiver;
use crate::media_stream::MediaStreamTrack;
use crate::rtp_parameters::{RTCRtpParameters, RtpCodecKind};
use crate::stats::RTCStatsReport;
use crate::transport::request::Responder;

/// Options for [`Transport::consume`](crate::transport::Transport::consume).
#[derive(Debug, Clone, Default)]
pub struct ConsumerOptions {
    /// Consumer id, assigned by the SFU.
    pub id: String,
    pub producer_id: String,
    pub kind: RtpCodecKind,
    pub rtp_parameters: RTCRtpParameters,
    /// Media stream the remote track is grouped into.
    pub stream_id: Option<String>,
    pub app_data: AppData,
}

/// Lifecycle requests a consumer sends to its transport. Pause and resume
/// are fire-and-forget: the transport batches them.
pub(crate) enum ConsumerRequest {
    Close,
    Pause,
    Resume,
    GetStats(Responder<RTCStatsReport>),
}

pub(crate) type ConsumerListener = Box<dyn Fn(ConsumerRequest) + Send + Sync>;

pub(crate) struct ConsumerInit {
    pub(crate) id: String,
    pub(crate) local_id: String,
    pub(crate) producer_id: String,
    pub(crate) rtp_receiver: Option<RtpReceiver>,
    pub(crate) track: MediaStreamTrack,
    pub(crate) rtp_parameters: RTCRtpParameters,
    pub(crate) app_data: AppData,
}

struct ConsumerState {
    closed: bool,
    paused: bool,
    app_data: AppData,
}

struct Inner {
    id: String,
    local_id: String,
    producer_id: String,
    rtp_receiver: Option<RtpReceiver>,
    track: MediaStreamTrack,
    rtp_parameters: RTCRtpParameters,
    state: Mutex<ConsumerState>,
    listener: ConsumerListener,
}

/// A remote track received through a transport.
#[derive(Clone)]
pub struct Consumer {
    inner: Arc<Inner>,
}

impl Consumer {
    pub(crate) fn new(init: ConsumerInit, listener: ConsumerListener) -> Self {
        let paused = !init.track.enabled();

        Self {
            inner: Arc::new(Inner {
                id: init.id,
                local_id: init.local_id,
                producer_id: init.producer_id,
                rtp_receiver: init.rtp_receiver,
                track: init.track,
                rtp_parameters: init.rtp_parameters,
                state: Mutex::new(ConsumerState {
                    closed: false,
                    paused,
                    app_data: init.app_data,
                }),
                listener,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Handler side id of the receiver.
    pub fn local_id(&self) -> &str {
        &self.inner.local_id
    }

    pub fn producer_id(&self) -> &str {
        &self.inner.producer_id
    }

    pub fn kind(&self) -> RtpCodecKind {
        self.inner.track.kind()
    }

    pub fn rtp_receiver(&self) -> Option<&RtpReceiver> {
        self.inner.rtp_receiver.as_ref()
    }

    pub fn track(&self) -> &MediaStreamTrack {
        &self.inner.track
    }

    pub fn rtp_parameters(&self) -> &RTCRtpParameters {
        &self.inner.rtp_parameters
    }

    pub fn closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    pub fn paused(&self) -> bool {
        self.inner.state.lock().paused
    }

    pub fn app_data(&self) -> AppData {
        self.inner.state.lock().app_data.clone()
    }

    pub fn set_app_data(&self, app_data: AppData) {
        self.inner.state.lock().app_data = app_data;
    }

    pub fn close(&self) {
        if !self.mark_closed() {
            return;
        }

        debug!("close() consumer {}", self.inner.id);
        (self.inner.listener)(ConsumerRequest::Close);
    }

    pub(crate) fn transport_closed(&self) {
        if self.mark_closed() {
            debug!("transport_closed() consumer {}", self.inner.id);
        }
    }

    fn mark_closed(&self) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
        }

        self.inner.track.stop();
        true
    }

    pub async fn get_stats(&self) -> Result<RTCStatsReport> {
        if self.closed() {
            return Err(Error::ErrConsumerClosed);
        }

        let (responder, pending) = Responder::channel();
        (self.inner.listener)(ConsumerRequest::GetStats(responder));
        pending.await
    }

    /// Pauses receiving. Does nothing on a closed or already paused
    /// consumer.
    pub fn pause(&self) {
        if !self.set_paused(true) {
            return;
        }

        self.inner.track.set_enabled(false);
        (self.inner.listener)(ConsumerRequest::Pause);
    }

    /// Resumes receiving. Does nothing on a closed or running consumer.
    pub fn resume(&self) {
        if !self.set_paused(false) {
            return;
        }

        self.inner.track.set_enabled(true);
        (self.inner.listener)(ConsumerRequest::Resume);
    }

    fn set_paused(&self, paused: bool) -> bool {
        let mut state = self.inner.state.lock();
        if state.closed {
            debug!("consumer {} closed, pause/resume ignored", self.inner.id);
            return false;
        }
        if state.paused == paused {
            return false;
        }
        state.paused = paused;
        true
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Consumer")
            .field("id", &self.inner.id)
            .field("local_id", &self.inner.local_id)
            .field("producer_id", &self.inner.producer_id)
            .field("closed", &state.closed)
            .field("paused", &state.paused)
            .finish_non_exhaustive()
    }
}
