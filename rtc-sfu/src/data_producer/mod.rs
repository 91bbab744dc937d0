//! Data producers: outgoing SCTP streams on a sending transport.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use log::debug;
use parking_lot::Mutex;
use shared::error::{Error, Result};

use crate::app_data::AppData;
use crate::data_channel::{DataChannel, RTCDataChannelState};
use crate::sctp_parameters::SctpStreamParameters;

/// Options for [`Transport::produce_data`](crate::transport::Transport::produce_data).
#[derive(Debug, Clone)]
pub struct DataProducerOptions {
    pub ordered: bool,
    pub max_packet_life_time: Option<u16>,
    pub max_retransmits: Option<u16>,
    pub label: String,
    pub protocol: String,
    pub app_data: AppData,
}

impl Default for DataProducerOptions {
    fn default() -> Self {
        Self {
            ordered: true,
            max_packet_life_time: None,
            max_retransmits: None,
            label: String::new(),
            protocol: String::new(),
            app_data: AppData::default(),
        }
    }
}

pub(crate) type CloseListener = Box<dyn Fn() + Send + Sync>;

struct Inner {
    id: String,
    data_channel: Arc<dyn DataChannel>,
    sctp_stream_parameters: SctpStreamParameters,
    closed: Mutex<bool>,
    app_data: Mutex<AppData>,
    listener: CloseListener,
}

/// Sends messages over a handler-created data channel.
#[derive(Clone)]
pub struct DataProducer {
    inner: Arc<Inner>,
}

impl DataProducer {
    pub(crate) fn new(
        id: String,
        data_channel: Arc<dyn DataChannel>,
        sctp_stream_parameters: SctpStreamParameters,
        app_data: AppData,
        listener: CloseListener,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                data_channel,
                sctp_stream_parameters,
                closed: Mutex::new(false),
                app_data: Mutex::new(app_data),
                listener,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn data_channel(&self) -> &Arc<dyn DataChannel> {
        &self.inner.data_channel
    }

    pub fn sctp_stream_parameters(&self) -> &SctpStreamParameters {
        &self.inner.sctp_stream_parameters
    }

    pub fn label(&self) -> String {
        self.inner.data_channel.label()
    }

    pub fn protocol(&self) -> String {
        self.inner.data_channel.protocol()
    }

    pub fn ready_state(&self) -> RTCDataChannelState {
        self.inner.data_channel.ready_state()
    }

    pub fn closed(&self) -> bool {
        *self.inner.closed.lock()
    }

    pub fn app_data(&self) -> AppData {
        self.inner.app_data.lock().clone()
    }

    pub fn set_app_data(&self, app_data: AppData) {
        *self.inner.app_data.lock() = app_data;
    }

    pub fn send(&self, data: Bytes) -> Result<()> {
        if self.closed() {
            return Err(Error::ErrDataProducerClosed);
        }
        self.inner.data_channel.send(data)
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        if self.closed() {
            return Err(Error::ErrDataProducerClosed);
        }
        self.inner.data_channel.send_text(text.into())
    }

    /// Closes the data producer. The transport closes the channel.
    pub fn close(&self) {
        if !self.mark_closed() {
            return;
        }

        debug!("close() data producer {}", self.inner.id);
        (self.inner.listener)();
    }

    pub(crate) fn transport_closed(&self) {
        if self.mark_closed() {
            debug!("transport_closed() data producer {}", self.inner.id);
            self.inner.data_channel.close();
        }
    }

    fn mark_closed(&self) -> bool {
        !std::mem::replace(&mut *self.inner.closed.lock(), true)
    }
}

impl fmt::Debug for DataProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProducer")
            .field("id", &self.inner.id)
            .field("sctp_stream_parameters", &self.inner.sctp_stream_parameters)
            .field("closed", &self.closed())
            .finish_non_exhaustive()
    }
}
