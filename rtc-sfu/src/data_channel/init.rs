use crate::data_channel::RTCDataChannelId;

/// DataChannelInit configures the channel the handler creates for a data
/// producer or data consumer.
///
/// ## Specifications
///
/// * [W3C]
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#dom-rtcdatachannelinit
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RTCDataChannelInit {
    /// ordered indicates if data is allowed to be delivered out of order. The
    /// default value of true, guarantees that data will be delivered in order.
    pub ordered: bool,

    /// max_packet_life_time limits the time (in milliseconds) during which the
    /// channel will transmit or retransmit data if not acknowledged.
    pub max_packet_life_time: Option<u16>,

    /// max_retransmits limits the number of times a channel will retransmit data
    /// if not successfully delivered.
    pub max_retransmits: Option<u16>,

    pub label: String,

    /// protocol describes the subprotocol name used for this channel.
    pub protocol: String,

    /// id sets the channel ID of a negotiated channel. Channels created for
    /// data consumers always use the stream id chosen by the remote.
    pub id: Option<RTCDataChannelId>,
}
