use bytes::Bytes;
use shared::error::Result;

pub mod init;
pub mod state;

pub use init::RTCDataChannelInit;
pub use state::RTCDataChannelState;

/// Identifier for a data channel within a particular transport, equal to
/// its SCTP stream id.
pub type RTCDataChannelId = u16;

/// DataChannel is a handler created network channel carried over the
/// transport's SCTP association.
///
/// The transport never reads from a channel; it only sends through data
/// producers and closes channels when their endpoint goes away.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcdatachannel)
pub trait DataChannel: Send + Sync {
    /// id returns the SCTP stream id of the channel.
    fn id(&self) -> RTCDataChannelId;

    /// label represents a label that can be used to distinguish this
    /// DataChannel object from other DataChannel objects.
    fn label(&self) -> String;

    /// protocol represents the name of the sub-protocol used with this
    /// DataChannel.
    fn protocol(&self) -> String;

    fn ready_state(&self) -> RTCDataChannelState;

    /// send sends the binary message to the DataChannel peer.
    fn send(&self, data: Bytes) -> Result<()>;

    /// send_text sends the text message to the DataChannel peer.
    fn send_text(&self, text: String) -> Result<()>;

    /// close closes the DataChannel. It may be called regardless of whether
    /// the DataChannel object was created by this peer or the remote peer.
    fn close(&self);
}
