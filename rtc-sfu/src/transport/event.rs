use crate::consumer::Consumer;
use crate::data_consumer::DataConsumer;
use crate::data_producer::DataProducer;
use crate::producer::Producer;
use crate::transport::state::{RTCConnectionState, RTCIceGatheringState};

/// Notifications broadcast to every [`Transport::subscribe`](super::Transport::subscribe)
/// receiver.
#[derive(Debug, Clone)]
pub enum RTCTransportEvent {
    OnIceGatheringStateChangeEvent(RTCIceGatheringState),
    OnConnectionStateChangeEvent(RTCConnectionState),

    OnNewProducer(Producer),
    OnNewConsumer(Consumer),
    OnNewDataProducer(DataProducer),
    OnNewDataConsumer(DataConsumer),

    /// The transport closed. Sent once.
    OnClose,
}
