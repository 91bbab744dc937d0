use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shared::util::math_rand_alpha_number;

use crate::constants::TRACK_ID_LEN;
use crate::media_stream::track_state::MediaStreamTrackState;
use crate::rtp_parameters::RtpCodecKind;

pub type MediaStreamTrackId = String;

struct TrackInner {
    id: MediaStreamTrackId,
    kind: RtpCodecKind,
    label: String,
    enabled: AtomicBool,
    ended: AtomicBool,
}

/// A shared handle to one media track.
///
/// Clones refer to the same track: disabling or stopping it through one
/// handle is observed by every other, which is how producers and consumers
/// reflect pause and close onto the application's track.
#[derive(Clone)]
pub struct MediaStreamTrack {
    inner: Arc<TrackInner>,
}

impl MediaStreamTrack {
    /// Creates a live, enabled track with a random id.
    pub fn new(kind: RtpCodecKind, label: impl Into<String>) -> Self {
        Self::with_id(math_rand_alpha_number(TRACK_ID_LEN), kind, label)
    }

    pub fn with_id(
        id: impl Into<MediaStreamTrackId>,
        kind: RtpCodecKind,
        label: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: id.into(),
                kind,
                label: label.into(),
                enabled: AtomicBool::new(true),
                ended: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &MediaStreamTrackId {
        &self.inner.id
    }

    pub fn kind(&self) -> RtpCodecKind {
        self.inner.kind
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn ready_state(&self) -> MediaStreamTrackState {
        if self.inner.ended.load(Ordering::SeqCst) {
            MediaStreamTrackState::Ended
        } else {
            MediaStreamTrackState::Live
        }
    }

    /// Permanently ends the track.
    pub fn stop(&self) {
        self.inner.ended.store(true, Ordering::SeqCst);
    }
}

impl PartialEq for MediaStreamTrack {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.id == other.inner.id
    }
}

impl fmt::Debug for MediaStreamTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStreamTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("label", &self.inner.label)
            .field("enabled", &self.enabled())
            .field("ready_state", &self.ready_state())
            .finish()
    }
}
