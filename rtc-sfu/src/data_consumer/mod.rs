//! Data consumers: incoming SCTP streams on a receiving transport.

use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::app_data::AppData;
use crate::data_channel::{DataChannel, RTCDataChannelState};
use crate::data_producer::CloseListener;
use crate::sctp_parameters::SctpStreamParameters;

/// Options for [`Transport::consume_data`](crate::transport::Transport::consume_data).
#[derive(Debug, Clone, Default)]
pub struct DataConsumerOptions {
    /// Data consumer id, assigned by the SFU.
    pub id: String,
    pub data_producer_id: String,
    pub sctp_stream_parameters: SctpStreamParameters,
    pub label: String,
    pub protocol: String,
    pub app_data: AppData,
}

struct Inner {
    id: String,
    data_producer_id: String,
    data_channel: Arc<dyn DataChannel>,
    sctp_stream_parameters: SctpStreamParameters,
    closed: Mutex<bool>,
    app_data: Mutex<AppData>,
    listener: CloseListener,
}

/// Receives messages over a handler-created data channel. Reading is done
/// on the channel itself.
#[derive(Clone)]
pub struct DataConsumer {
    inner: Arc<Inner>,
}

impl DataConsumer {
    pub(crate) fn new(
        options: DataConsumerOptions,
        data_channel: Arc<dyn DataChannel>,
        listener: CloseListener,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: options.id,
                data_producer_id: options.data_producer_id,
                data_channel,
                sctp_stream_parameters: options.sctp_stream_parameters,
                closed: Mutex::new(false),
                app_data: Mutex::new(options.app_data),
                listener,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn data_producer_id(&self) -> &str {
        &self.inner.data_producer_id
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

    pub fn close(&self) {
        if !self.mark_closed() {
            return;
        }

        debug!("close() data consumer {}", self.inner.id);
        (self.inner.listener)();
    }

    pub(crate) fn transport_closed(&self) {
        if self.mark_closed() {
            debug!("transport_closed() data consumer {}", self.inner.id);
            self.inner.data_channel.close();
        }
    }

    fn mark_closed(&self) -> bool {
        !std::mem::replace(&mut *self.inner.closed.lock(), true)
    }
}

impl fmt::Debug for DataConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataConsumer")
            .field("id", &self.inner.id)
            .field("data_producer_id", &self.inner.data_producer_id)
            .field("closed", &self.closed())
            .finish_non_exhaustive()
    }
}
