//! Request/response notifications sent to the application.
//!
//! Some steps need an answer only the application can give: the DTLS
//! parameters must reach the remote transport before connecting, and every
//! new producer needs an id assigned by the SFU. The transport sends a typed
//! request through the channel returned by `on_connect()`, `on_produce()` or
//! `on_produce_data()` and waits until the application calls `accept` or
//! `reject` on it. A request dropped without an answer fails the waiting
//! operation with [`Error::ErrRequestDropped`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use shared::error::{Error, Result};
use tokio::sync::{mpsc, oneshot};

use crate::app_data::AppData;
use crate::rtp_parameters::{RTCRtpParameters, RtpCodecKind};
use crate::sctp_parameters::SctpStreamParameters;
use crate::transport::dtls::RTCDtlsParameters;

/// Single-use continuation completing a pending request.
pub(crate) struct Responder<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Responder<T> {
    pub(crate) fn channel() -> (Self, PendingResponse<T>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, PendingResponse { rx })
    }

    pub(crate) fn respond(self, result: Result<T>) {
        // nobody waiting any more
        let _ = self.tx.send(result);
    }

    pub(crate) fn accept(self, value: T) {
        self.respond(Ok(value));
    }

    pub(crate) fn reject(self, err: Error) {
        self.respond(Err(err));
    }
}

/// Answer to a request, resolving once the continuation is used.
pub(crate) struct PendingResponse<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for PendingResponse<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ErrRequestDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// The transport needs the remote side to learn the local DTLS parameters.
///
/// Signal `dtls_parameters` to the SFU, then `accept()`, or `reject()` if
/// that failed.
pub struct ConnectRequest {
    pub dtls_parameters: RTCDtlsParameters,
    responder: Responder<()>,
}

impl ConnectRequest {
    pub(crate) fn new(dtls_parameters: RTCDtlsParameters, responder: Responder<()>) -> Self {
        Self {
            dtls_parameters,
            responder,
        }
    }

    pub fn accept(self) {
        self.responder.accept(());
    }

    pub fn reject(self, err: Error) {
        self.responder.reject(err);
    }
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("dtls_parameters", &self.dtls_parameters)
            .finish_non_exhaustive()
    }
}

/// A new producer needs its remote id.
///
/// Signal the parameters to the SFU and `accept()` with the id it assigned.
pub struct ProduceRequest {
    pub kind: RtpCodecKind,
    pub rtp_parameters: RTCRtpParameters,
    pub app_data: AppData,
    responder: Responder<String>,
}

impl ProduceRequest {
    pub(crate) fn new(
        kind: RtpCodecKind,
        rtp_parameters: RTCRtpParameters,
        app_data: AppData,
        responder: Responder<String>,
    ) -> Self {
        Self {
            kind,
            rtp_parameters,
            app_data,
            responder,
        }
    }

    pub fn accept(self, id: impl Into<String>) {
        self.responder.accept(id.into());
    }

    pub fn reject(self, err: Error) {
        self.responder.reject(err);
    }
}

impl fmt::Debug for ProduceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProduceRequest")
            .field("kind", &self.kind)
            .field("rtp_parameters", &self.rtp_parameters)
            .finish_non_exhaustive()
    }
}

/// A new data producer needs its remote id.
pub struct ProduceDataRequest {
    pub sctp_stream_parameters: SctpStreamParameters,
    pub label: String,
    pub protocol: String,
    pub app_data: AppData,
    responder: Responder<String>,
}

impl ProduceDataRequest {
    pub(crate) fn new(
        sctp_stream_parameters: SctpStreamParameters,
        label: String,
        protocol: String,
        app_data: AppData,
        responder: Responder<String>,
    ) -> Self {
        Self {
            sctp_stream_parameters,
            label,
            protocol,
            app_data,
            responder,
        }
    }

    pub fn accept(self, id: impl Into<String>) {
        self.responder.accept(id.into());
    }

    pub fn reject(self, err: Error) {
        self.responder.reject(err);
    }
}

impl fmt::Debug for ProduceDataRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProduceDataRequest")
            .field("sctp_stream_parameters", &self.sctp_stream_parameters)
            .field("label", &self.label)
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// The single listener of one kind of request. Subscribing again replaces
/// the previous listener.
pub(crate) struct RequestListener<R> {
    tx: Option<mpsc::UnboundedSender<R>>,
}

impl<R> Default for RequestListener<R> {
    fn default() -> Self {
        Self { tx: None }
    }
}

impl<R> RequestListener<R> {
    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<R> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tx = Some(tx);
        rx
    }

    /// Whether a live receiver would get a request dispatched now.
    pub(crate) fn is_listening(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Hands `request` to the listener, giving it back if there is none.
    pub(crate) fn dispatch(&self, request: R) -> std::result::Result<(), R> {
        match &self.tx {
            Some(tx) => tx.send(request).map_err(|mpsc::error::SendError(request)| request),
            None => Err(request),
        }
    }
}

#[derive(Default)]
pub(crate) struct RequestListeners {
    pub(crate) connect: RequestListener<ConnectRequest>,
    pub(crate) produce: RequestListener<ProduceRequest>,
    pub(crate) produce_data: RequestListener<ProduceDataRequest>,
}
