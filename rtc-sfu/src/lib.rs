//! # RTC SFU - Client-side SFU Transport Controller
//!
//! Client-side control of the transports an application opens towards a
//! Selective Forwarding Unit. A [`Transport`] wraps one network
//! [`Handler`](handler::Handler) (typically a peer connection) and multiplexes
//! every logical endpoint over it:
//!
//! - **[`Producer`](producer::Producer)** - a local track sent to the SFU
//! - **[`Consumer`](consumer::Consumer)** - a remote track received from the SFU
//! - **[`DataProducer`](data_producer::DataProducer)** /
//!   **[`DataConsumer`](data_consumer::DataConsumer)** - the data channel equivalents
//!
//! The handler performs the actual ICE/DTLS negotiation and can only
//! renegotiate one change at a time, so the transport serializes every
//! renegotiation through a [`SerialTaskQueue`](serial_queue::SerialTaskQueue)
//! and coalesces consumer changes made in the same scheduling tick into a
//! single handler call.
//!
//! ## Signaling
//!
//! The transport never talks to the SFU itself. Whenever it needs an answer
//! only the SFU can give, it sends a typed request to the application:
//!
//! - [`ConnectRequest`](transport::ConnectRequest) via [`Transport::on_connect`] -
//!   forward the local DTLS parameters
//! - [`ProduceRequest`](transport::ProduceRequest) via [`Transport::on_produce`] -
//!   obtain the id of a new producer
//! - [`ProduceDataRequest`](transport::ProduceDataRequest) via
//!   [`Transport::on_produce_data`] - obtain the id of a new data producer
//!
//! Observers follow state changes and new entities through
//! [`Transport::subscribe`].
//!
//! ## Module Organization
//!
//! - **[`transport`]** - the transport, its configuration, state and events
//! - **[`handler`]** - the network handler interface
//! - **[`ortc`]** - RTP/SCTP parameter checks
//! - **[`rtp_parameters`]** / **[`sctp_parameters`]** - parameter types
//! - **[`serial_queue`]** - the serial task queue

#![warn(rust_2018_idioms)]

pub use shared;

pub mod app_data;
pub(crate) mod constants;
pub mod consumer;
pub mod data_channel;
pub mod data_consumer;
pub mod data_producer;
pub mod handler;
pub mod media_stream;
pub mod ortc;
pub mod producer;
pub mod rtp_parameters;
pub mod sctp_parameters;
pub mod serial_queue;
pub mod stats;
pub mod transport;

pub use transport::Transport;
