use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Callers usually only need to know which family an error belongs to:
/// whether the operation was attempted at the wrong time, with malformed
/// arguments, against a transport that cannot do it, or whether the
/// network layer itself refused it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation attempted after close, or before required listeners exist.
    InvalidState,
    /// Malformed or missing argument.
    Type,
    /// Operation not valid for this transport's direction or capabilities.
    Unsupported,
    /// The network handler rejected the operation.
    Negotiation,
    /// RTP/SCTP parameters rejected by the capability checks.
    CapabilityMismatch,
    /// The task never ran because its queue was stopped.
    QueueStopped,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("transport: closed")]
    ErrTransportClosed,
    #[error("producer: closed")]
    ErrProducerClosed,
    #[error("consumer: closed")]
    ErrConsumerClosed,
    #[error("data producer: closed")]
    ErrDataProducerClosed,
    #[error("data consumer: closed")]
    ErrDataConsumerClosed,
    #[error("data channel: closed")]
    ErrDataChannelClosed,
    #[error("track ended")]
    ErrTrackEnded,
    #[error("no \"connect\" listener set into this transport")]
    ErrNoConnectListener,
    #[error("no \"produce\" listener set into this transport")]
    ErrNoProduceListener,
    #[error("no \"producedata\" listener set into this transport")]
    ErrNoProduceDataListener,
    #[error("no tokio runtime available")]
    ErrNoRuntime,

    #[error("missing track")]
    ErrMissingTrack,
    #[error("missing id")]
    ErrMissingId,
    #[error("missing producer id")]
    ErrMissingProducerId,
    #[error("missing data producer id")]
    ErrMissingDataProducerId,
    #[error("missing ice parameters")]
    ErrMissingIceParameters,
    #[error("invalid media kind {0}")]
    ErrInvalidMediaKind(String),
    #[error("invalid transport direction {0}")]
    ErrInvalidTransportDirection(String),
    #[error("request dropped without an answer")]
    ErrRequestDropped,

    #[error("not a sending transport")]
    ErrNotSendingTransport,
    #[error("not a receiving transport")]
    ErrNotReceivingTransport,
    #[error("cannot produce {0}")]
    ErrCannotProduce(String),
    #[error("cannot consume this producer")]
    ErrCannotConsume,
    #[error("sctp not enabled by remote transport")]
    ErrSctpNotEnabled,
    #[error("not a video producer")]
    ErrNotVideoProducer,

    #[error("invalid rtp parameters: {0}")]
    ErrInvalidRtpParameters(String),
    #[error("invalid sctp stream parameters: {0}")]
    ErrInvalidSctpStreamParameters(String),

    #[error("queue: stopped")]
    ErrQueueStopped,

    #[error("handler: {0}")]
    ErrHandler(String),
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns the family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ErrTransportClosed
            | Error::ErrProducerClosed
            | Error::ErrConsumerClosed
            | Error::ErrDataProducerClosed
            | Error::ErrDataConsumerClosed
            | Error::ErrDataChannelClosed
            | Error::ErrTrackEnded
            | Error::ErrNoConnectListener
            | Error::ErrNoProduceListener
            | Error::ErrNoProduceDataListener
            | Error::ErrNoRuntime => ErrorKind::InvalidState,

            Error::ErrMissingTrack
            | Error::ErrMissingId
            | Error::ErrMissingProducerId
            | Error::ErrMissingDataProducerId
            | Error::ErrMissingIceParameters
            | Error::ErrInvalidMediaKind(_)
            | Error::ErrInvalidTransportDirection(_)
            | Error::ErrRequestDropped => ErrorKind::Type,

            Error::ErrNotSendingTransport
            | Error::ErrNotReceivingTransport
            | Error::ErrCannotProduce(_)
            | Error::ErrCannotConsume
            | Error::ErrSctpNotEnabled
            | Error::ErrNotVideoProducer => ErrorKind::Unsupported,

            Error::ErrInvalidRtpParameters(_) | Error::ErrInvalidSctpStreamParameters(_) => {
                ErrorKind::CapabilityMismatch
            }

            Error::ErrQueueStopped => ErrorKind::QueueStopped,

            Error::ErrHandler(_) | Error::Other(_) => ErrorKind::Negotiation,
        }
    }
}
