//! The transport controller.
//!
//! A [`Transport`] owns one network handler and multiplexes producers,
//! consumers, data producers and data consumers over it. Every operation that
//! renegotiates goes through the transport's [`SerialTaskQueue`], so the
//! handler only ever performs one renegotiation at a time. Consumer changes
//! requested within the same scheduling tick are coalesced into a single
//! handler call (see `batch`).
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rtc_sfu::handler::Handler;
//! # use rtc_sfu::media_stream::MediaStreamTrack;
//! # use rtc_sfu::producer::ProducerOptions;
//! # use rtc_sfu::rtp_parameters::RtpCodecKind;
//! # use rtc_sfu::transport::configuration::TransportOptions;
//! # use rtc_sfu::Transport;
//! # async fn example(options: TransportOptions, handler: Arc<dyn Handler>) -> shared::error::Result<()> {
//! let transport = Transport::new(options, handler)?;
//!
//! let mut connect = transport.on_connect();
//! tokio::spawn(async move {
//!     while let Some(request) = connect.recv().await {
//!         // signal request.dtls_parameters to the SFU
//!         request.accept();
//!     }
//! });
//!
//! let mut produce = transport.on_produce();
//! tokio::spawn(async move {
//!     while let Some(request) = produce.recv().await {
//!         // signal request.rtp_parameters to the SFU, which assigns an id
//!         request.accept("producer-id");
//!     }
//! });
//!
//! let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
//! let _producer = transport.produce(ProducerOptions::new(track)).await?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod batch;
pub mod configuration;
pub mod direction;
pub mod dtls;
pub(crate) mod endpoint;
pub mod event;
pub mod ice;
pub mod request;
pub mod state;

pub use direction::TransportDirection;
pub use event::RTCTransportEvent;
pub use request::{ConnectRequest, ProduceDataRequest, ProduceRequest};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::Mutex;
use shared::error::{Error, Result};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};

use crate::app_data::AppData;
use crate::constants::TRANSPORT_EVENT_CHANNEL_CAPACITY;
use crate::consumer::{Consumer, ConsumerOptions};
use crate::data_channel::{DataChannel, RTCDataChannelInit};
use crate::data_consumer::{DataConsumer, DataConsumerOptions};
use crate::data_producer::{DataProducer, DataProducerOptions};
use crate::handler::{
    Handler, HandlerEvents, HandlerReceiveDataChannelOptions, HandlerRunOptions,
    HandlerSendDataChannelResult, HandlerSendOptions, HandlerSendResult,
};
use crate::media_stream::{MediaStreamTrack, MediaStreamTrackState};
use crate::ortc::Ortc;
use crate::producer::{Producer, ProducerInit, ProducerOptions};
use crate::rtp_parameters::{
    normalize_encodings, CanProduceByKind, ExtendedRtpCapabilities, RTCRtpParameters,
    RtpCodecKind,
};
use crate::sctp_parameters::SctpStreamParameters;
use crate::serial_queue::SerialTaskQueue;
use crate::stats::RTCStatsReport;
use batch::{ConsumerBatches, ConsumerCreationTask, CreateConsumers};
use configuration::TransportOptions;
use dtls::RTCDtlsParameters;
use ice::{RTCIceParameters, RTCIceServer};
use request::{PendingResponse, RequestListeners, Responder};
use state::{RTCConnectionState, RTCIceGatheringState};

pub(crate) struct TransportState {
    pub(crate) closed: bool,
    connection_state: RTCConnectionState,
    ice_gathering_state: RTCIceGatheringState,
    app_data: AppData,
    listeners: RequestListeners,
    pub(crate) producers: HashMap<String, Producer>,
    pub(crate) consumers: HashMap<String, Consumer>,
    pub(crate) data_producers: HashMap<String, DataProducer>,
    pub(crate) data_consumers: HashMap<String, DataConsumer>,
    pub(crate) batches: ConsumerBatches,
    pub(crate) probator_consumer_created: bool,
}

pub(crate) struct TransportInner {
    id: String,
    direction: TransportDirection,
    extended_rtp_capabilities: ExtendedRtpCapabilities,
    can_produce_by_kind: CanProduceByKind,
    max_sctp_message_size: Option<u32>,
    pub(crate) handler: Arc<dyn Handler>,
    pub(crate) ortc: Arc<dyn Ortc>,
    pub(crate) queue: SerialTaskQueue,
    pub(crate) runtime: Handle,
    events: broadcast::Sender<RTCTransportEvent>,
    pub(crate) state: Mutex<TransportState>,
}

impl TransportInner {
    pub(crate) fn emit(&self, event: RTCTransportEvent) {
        // no subscriber is not an error
        let _ = self.events.send(event);
    }

    /// Relays the handler's connect request to the application.
    pub(crate) fn request_connect(
        &self,
        dtls_parameters: RTCDtlsParameters,
    ) -> Result<PendingResponse<()>> {
        let state = self.state.lock();
        if state.closed {
            return Err(Error::ErrTransportClosed);
        }

        let (responder, pending) = Responder::channel();
        state
            .listeners
            .connect
            .dispatch(ConnectRequest::new(dtls_parameters, responder))
            .map_err(|_| Error::ErrNoConnectListener)?;

        Ok(pending)
    }

    fn request_produce(
        &self,
        kind: RtpCodecKind,
        rtp_parameters: RTCRtpParameters,
        app_data: AppData,
    ) -> Result<PendingResponse<String>> {
        let state = self.state.lock();
        if state.closed {
            return Err(Error::ErrTransportClosed);
        }

        let (responder, pending) = Responder::channel();
        state
            .listeners
            .produce
            .dispatch(ProduceRequest::new(kind, rtp_parameters, app_data, responder))
            .map_err(|_| Error::ErrNoProduceListener)?;

        Ok(pending)
    }

    fn request_produce_data(
        &self,
        sctp_stream_parameters: SctpStreamParameters,
        label: String,
        protocol: String,
        app_data: AppData,
    ) -> Result<PendingResponse<String>> {
        let state = self.state.lock();
        if state.closed {
            return Err(Error::ErrTransportClosed);
        }

        let (responder, pending) = Responder::channel();
        let request =
            ProduceDataRequest::new(sctp_stream_parameters, label, protocol, app_data, responder);
        state
            .listeners
            .produce_data
            .dispatch(request)
            .map_err(|_| Error::ErrNoProduceDataListener)?;

        Ok(pending)
    }

    pub(crate) fn on_ice_gathering_state_change(&self, ice_gathering_state: RTCIceGatheringState) {
        {
            let mut state = self.state.lock();
            if state.closed
                || ice_gathering_state == RTCIceGatheringState::Unspecified
                || ice_gathering_state == state.ice_gathering_state
            {
                return;
            }
            state.ice_gathering_state = ice_gathering_state;
        }

        debug!("ice gathering state changed to {ice_gathering_state}");
        self.emit(RTCTransportEvent::OnIceGatheringStateChangeEvent(
            ice_gathering_state,
        ));
    }

    pub(crate) fn on_connection_state_change(&self, connection_state: RTCConnectionState) {
        {
            let mut state = self.state.lock();
            if state.closed
                || connection_state == RTCConnectionState::Unspecified
                || connection_state == state.connection_state
            {
                return;
            }
            state.connection_state = connection_state;
        }

        debug!("connection state changed to {connection_state}");
        self.emit(RTCTransportEvent::OnConnectionStateChangeEvent(
            connection_state,
        ));
    }

    pub(crate) fn register_producer(&self, producer: &Producer) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::ErrTransportClosed);
        }
        state
            .producers
            .insert(producer.id().to_owned(), producer.clone());
        Ok(())
    }

    pub(crate) fn register_consumer(&self, consumer: &Consumer) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::ErrTransportClosed);
        }
        state
            .consumers
            .insert(consumer.id().to_owned(), consumer.clone());
        Ok(())
    }

    fn register_data_producer(&self, data_producer: &DataProducer) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::ErrTransportClosed);
        }
        state
            .data_producers
            .insert(data_producer.id().to_owned(), data_producer.clone());
        Ok(())
    }

    fn register_data_consumer(&self, data_consumer: &DataConsumer) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::ErrTransportClosed);
        }
        state
            .data_consumers
            .insert(data_consumer.id().to_owned(), data_consumer.clone());
        Ok(())
    }

    /// Fails when the transport is closed or was not created for `direction`.
    fn ensure_usable(&self, direction: TransportDirection) -> Result<()> {
        if self.state.lock().closed {
            return Err(Error::ErrTransportClosed);
        }

        if self.direction != direction {
            return Err(match direction {
                TransportDirection::Recv => Error::ErrNotReceivingTransport,
                _ => Error::ErrNotSendingTransport,
            });
        }

        Ok(())
    }

    /// A connect listener is only needed until the transport got past `new`.
    fn ensure_connect_listener(&self) -> Result<()> {
        let state = self.state.lock();
        if state.connection_state == RTCConnectionState::New
            && !state.listeners.connect.is_listening()
        {
            return Err(Error::ErrNoConnectListener);
        }
        Ok(())
    }

    fn ensure_sctp_enabled(&self) -> Result<()> {
        if self.max_sctp_message_size.is_none() {
            return Err(Error::ErrSctpNotEnabled);
        }
        Ok(())
    }

    async fn produce_in_queue(
        self: Arc<Self>,
        track: MediaStreamTrack,
        options: ProducerOptions,
    ) -> Result<Producer> {
        let HandlerSendResult {
            local_id,
            mut rtp_parameters,
            rtp_sender,
        } = self
            .handler
            .send(HandlerSendOptions {
                track: track.clone(),
                encodings: normalize_encodings(&options.encodings),
                codec_options: options.codec_options,
                codec: options.codec,
            })
            .await?;

        let id = match self
            .negotiate_producer(track.kind(), &mut rtp_parameters, &options.app_data)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                if let Err(stop_err) = self.handler.stop_sending(&local_id).await {
                    warn!("produce() | stop_sending() {local_id} failed: {stop_err}");
                }
                return Err(err);
            }
        };

        let producer = Producer::new(
            ProducerInit {
                id: id.clone(),
                local_id: local_id.clone(),
                rtp_sender,
                track,
                rtp_parameters,
                stop_tracks: options.stop_tracks,
                disable_track_on_pause: options.disable_track_on_pause,
                zero_rtp_on_pause: options.zero_rtp_on_pause,
                app_data: options.app_data,
            },
            endpoint::producer_listener(&self, id, local_id),
        );

        self.register_producer(&producer)?;
        self.emit(RTCTransportEvent::OnNewProducer(producer.clone()));

        Ok(producer)
    }

    async fn negotiate_producer(
        &self,
        kind: RtpCodecKind,
        rtp_parameters: &mut RTCRtpParameters,
        app_data: &AppData,
    ) -> Result<String> {
        self.ortc.validate_rtp_parameters(rtp_parameters)?;
        self.request_produce(kind, rtp_parameters.clone(), app_data.clone())?
            .await
    }

    async fn produce_data_in_queue(
        self: Arc<Self>,
        init: RTCDataChannelInit,
        app_data: AppData,
    ) -> Result<DataProducer> {
        let HandlerSendDataChannelResult {
            data_channel,
            mut sctp_stream_parameters,
        } = self.handler.send_data_channel(init).await?;

        let id = match self
            .negotiate_data_producer(&data_channel, &mut sctp_stream_parameters, &app_data)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                data_channel.close();
                return Err(err);
            }
        };

        let data_producer = DataProducer::new(
            id.clone(),
            Arc::clone(&data_channel),
            sctp_stream_parameters,
            app_data,
            endpoint::data_producer_listener(&self, id, data_channel),
        );

        self.register_data_producer(&data_producer)?;
        self.emit(RTCTransportEvent::OnNewDataProducer(data_producer.clone()));

        Ok(data_producer)
    }

    async fn negotiate_data_producer(
        &self,
        data_channel: &Arc<dyn DataChannel>,
        sctp_stream_parameters: &mut SctpStreamParameters,
        app_data: &AppData,
    ) -> Result<String> {
        self.ortc
            .validate_sctp_stream_parameters(sctp_stream_parameters)?;
        self.request_produce_data(
            *sctp_stream_parameters,
            data_channel.label(),
            data_channel.protocol(),
            app_data.clone(),
        )?
        .await
    }

    async fn consume_data_in_queue(
        self: Arc<Self>,
        options: DataConsumerOptions,
    ) -> Result<DataConsumer> {
        let result = self
            .handler
            .receive_data_channel(HandlerReceiveDataChannelOptions {
                sctp_stream_parameters: options.sctp_stream_parameters,
                label: options.label.clone(),
                protocol: options.protocol.clone(),
            })
            .await?;

        let data_channel = result.data_channel;
        let listener =
            endpoint::data_consumer_listener(&self, options.id.clone(), Arc::clone(&data_channel));
        let data_consumer = DataConsumer::new(options, Arc::clone(&data_channel), listener);

        if let Err(err) = self.register_data_consumer(&data_consumer) {
            data_channel.close();
            return Err(err);
        }
        self.emit(RTCTransportEvent::OnNewDataConsumer(data_consumer.clone()));

        Ok(data_consumer)
    }

    /// Closes the transport once. Entities are told the transport is gone
    /// rather than closed by the application, so they do not call back.
    pub(crate) fn close(&self) {
        let (producers, consumers, data_producers, data_consumers, pending) = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.connection_state = RTCConnectionState::Closed;
            state.listeners = RequestListeners::default();

            let batches = std::mem::take(&mut state.batches);
            (
                std::mem::take(&mut state.producers),
                std::mem::take(&mut state.consumers),
                std::mem::take(&mut state.data_producers),
                std::mem::take(&mut state.data_consumers),
                batches.create.items,
            )
        };

        debug!("close() transport {}", self.id);

        self.queue.stop();
        self.handler.close();

        for producer in producers.into_values() {
            producer.transport_closed();
        }
        for consumer in consumers.into_values() {
            consumer.transport_closed();
        }
        for data_producer in data_producers.into_values() {
            data_producer.transport_closed();
        }
        for data_consumer in data_consumers.into_values() {
            data_consumer.transport_closed();
        }
        for task in pending {
            task.responder.reject(Error::ErrTransportClosed);
        }

        self.emit(RTCTransportEvent::OnClose);
    }
}

impl Drop for TransportInner {
    fn drop(&mut self) {
        self.close();
    }
}

/// One sending or receiving transport.
///
/// Cloning is cheap and every clone refers to the same transport. The
/// transport closes when [`Transport::close`] is called or when the last
/// clone is dropped.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl Transport {
    /// Creates the transport and starts `handler`. Must be called within a
    /// Tokio runtime, which then drives every background task of the
    /// transport.
    pub fn new(options: TransportOptions, handler: Arc<dyn Handler>) -> Result<Self> {
        options.validate()?;
        let runtime = Handle::try_current().map_err(|_| Error::ErrNoRuntime)?;

        debug!(
            "new() [id:{}, direction:{}, handler:{}]",
            options.id,
            options.direction,
            handler.name()
        );

        let (events, _) = broadcast::channel(TRANSPORT_EVENT_CHANNEL_CAPACITY);
        let inner = Arc::new(TransportInner {
            id: options.id.clone(),
            direction: options.direction,
            extended_rtp_capabilities: options.extended_rtp_capabilities.clone(),
            can_produce_by_kind: options.can_produce_by_kind(),
            max_sctp_message_size: options.max_sctp_message_size(),
            handler: Arc::clone(&handler),
            ortc: Arc::clone(&options.ortc),
            queue: SerialTaskQueue::new(runtime.clone()),
            runtime,
            events,
            state: Mutex::new(TransportState {
                closed: false,
                connection_state: RTCConnectionState::New,
                ice_gathering_state: RTCIceGatheringState::New,
                app_data: options.app_data.clone(),
                listeners: RequestListeners::default(),
                producers: HashMap::new(),
                consumers: HashMap::new(),
                data_producers: HashMap::new(),
                data_consumers: HashMap::new(),
                batches: ConsumerBatches::default(),
                probator_consumer_created: false,
            }),
        });

        handler.run(HandlerRunOptions {
            direction: options.direction,
            ice_parameters: options.ice_parameters.clone(),
            ice_candidates: options.ice_candidates.clone(),
            dtls_parameters: options.dtls_parameters.clone(),
            sctp_parameters: options.sctp_parameters,
            ice_servers: options.get_ice_servers(),
            ice_transport_policy: options.ice_transport_policy,
            additional_settings: options.get_additional_settings(),
            extended_rtp_capabilities: options.extended_rtp_capabilities.clone(),
            events: HandlerEvents::new(Arc::downgrade(&inner)),
        })?;

        Ok(Self { inner })
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn direction(&self) -> TransportDirection {
        self.inner.direction
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.inner.handler
    }

    pub fn extended_rtp_capabilities(&self) -> &ExtendedRtpCapabilities {
        &self.inner.extended_rtp_capabilities
    }

    /// Maximum SCTP message size; `None` when data channels are unsupported.
    pub fn max_sctp_message_size(&self) -> Option<u32> {
        self.inner.max_sctp_message_size
    }

    pub fn closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    pub fn connection_state(&self) -> RTCConnectionState {
        self.inner.state.lock().connection_state
    }

    pub fn ice_gathering_state(&self) -> RTCIceGatheringState {
        self.inner.state.lock().ice_gathering_state
    }

    pub fn app_data(&self) -> AppData {
        self.inner.state.lock().app_data.clone()
    }

    pub fn set_app_data(&self, app_data: AppData) {
        self.inner.state.lock().app_data = app_data;
    }

    pub fn producers(&self) -> Vec<Producer> {
        self.inner.state.lock().producers.values().cloned().collect()
    }

    pub fn consumers(&self) -> Vec<Consumer> {
        self.inner.state.lock().consumers.values().cloned().collect()
    }

    pub fn data_producers(&self) -> Vec<DataProducer> {
        self.inner
            .state
            .lock()
            .data_producers
            .values()
            .cloned()
            .collect()
    }

    pub fn data_consumers(&self) -> Vec<DataConsumer> {
        self.inner
            .state
            .lock()
            .data_consumers
            .values()
            .cloned()
            .collect()
    }

    pub fn get_producer(&self, id: &str) -> Option<Producer> {
        self.inner.state.lock().producers.get(id).cloned()
    }

    pub fn get_consumer(&self, id: &str) -> Option<Consumer> {
        self.inner.state.lock().consumers.get(id).cloned()
    }

    pub fn get_data_producer(&self, id: &str) -> Option<DataProducer> {
        self.inner.state.lock().data_producers.get(id).cloned()
    }

    pub fn get_data_consumer(&self, id: &str) -> Option<DataConsumer> {
        self.inner.state.lock().data_consumers.get(id).cloned()
    }

    /// Observes state changes, new entities and closure.
    pub fn subscribe(&self) -> broadcast::Receiver<RTCTransportEvent> {
        self.inner.events.subscribe()
    }

    /// Listens for `connect` requests, replacing any previous listener.
    pub fn on_connect(&self) -> mpsc::UnboundedReceiver<ConnectRequest> {
        self.inner.state.lock().listeners.connect.subscribe()
    }

    /// Listens for `produce` requests, replacing any previous listener.
    pub fn on_produce(&self) -> mpsc::UnboundedReceiver<ProduceRequest> {
        self.inner.state.lock().listeners.produce.subscribe()
    }

    /// Listens for `producedata` requests, replacing any previous listener.
    pub fn on_produce_data(&self) -> mpsc::UnboundedReceiver<ProduceDataRequest> {
        self.inner.state.lock().listeners.produce_data.subscribe()
    }

    /// Closes the transport and every entity on it.
    pub fn close(&self) {
        self.inner.close();
    }

    pub async fn get_stats(&self) -> Result<RTCStatsReport> {
        if self.closed() {
            return Err(Error::ErrTransportClosed);
        }

        self.inner.handler.get_transport_stats().await
    }

    /// Restarts ICE with the new remote ICE parameters.
    pub async fn restart_ice(&self, ice_parameters: RTCIceParameters) -> Result<()> {
        debug!("restart_ice()");

        if self.closed() {
            return Err(Error::ErrTransportClosed);
        }
        if ice_parameters.username_fragment.is_empty() || ice_parameters.password.is_empty() {
            return Err(Error::ErrMissingIceParameters);
        }

        let handler = Arc::clone(&self.inner.handler);
        self.inner
            .queue
            .push("restart_ice()", async move {
                handler.restart_ice(ice_parameters).await
            })
            .await
    }

    pub async fn update_ice_servers(&self, ice_servers: Vec<RTCIceServer>) -> Result<()> {
        debug!("update_ice_servers()");

        if self.closed() {
            return Err(Error::ErrTransportClosed);
        }

        let ice_servers = ice_servers.iter().map(RTCIceServer::sanitized).collect();
        let handler = Arc::clone(&self.inner.handler);
        self.inner
            .queue
            .push("update_ice_servers()", async move {
                handler.update_ice_servers(ice_servers).await
            })
            .await
    }

    /// Sends a track. The application answers the resulting `produce`
    /// request with the id assigned by the SFU.
    pub async fn produce(&self, options: ProducerOptions) -> Result<Producer> {
        debug!("produce() [track:{:?}]", options.track);

        let track = self.check_produce(&options)?;
        let stop_tracks = options.stop_tracks;

        let inner = Arc::clone(&self.inner);
        let task_track = track.clone();
        let result = self
            .inner
            .queue
            .push("produce()", async move {
                inner.produce_in_queue(task_track, options).await
            })
            .await;

        if result.is_err() && stop_tracks {
            track.stop();
        }

        result
    }

    fn check_produce(&self, options: &ProducerOptions) -> Result<MediaStreamTrack> {
        if self.closed() {
            return Err(Error::ErrTransportClosed);
        }

        let track = options.track.clone().ok_or(Error::ErrMissingTrack)?;
        if track.ready_state() == MediaStreamTrackState::Ended {
            return Err(Error::ErrTrackEnded);
        }

        self.inner.ensure_usable(TransportDirection::Send)?;

        if !self.inner.can_produce_by_kind.can_produce(track.kind()) {
            return Err(Error::ErrCannotProduce(track.kind().to_string()));
        }

        self.inner.ensure_connect_listener()?;

        if !self.inner.state.lock().listeners.produce.is_listening() {
            return Err(Error::ErrNoProduceListener);
        }

        Ok(track)
    }

    /// Receives a remote producer. Calls made within the same scheduling
    /// tick share a single handler `receive()` call and resolve in call
    /// order.
    pub async fn consume(&self, mut options: ConsumerOptions) -> Result<Consumer> {
        debug!("consume() [id:{}, producer_id:{}]", options.id, options.producer_id);

        options.rtp_parameters = self.check_consume(&options)?;

        let (responder, pending) = Responder::channel();
        {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(Error::ErrTransportClosed);
            }
            state
                .batches
                .create
                .items
                .push(ConsumerCreationTask { options, responder });
        }

        batch::schedule_flush::<CreateConsumers>(&self.inner);

        pending.await
    }

    /// Returns the remote parameters with their defaults filled in.
    fn check_consume(&self, options: &ConsumerOptions) -> Result<RTCRtpParameters> {
        self.inner.ensure_usable(TransportDirection::Recv)?;

        if options.id.is_empty() {
            return Err(Error::ErrMissingId);
        }
        if options.producer_id.is_empty() {
            return Err(Error::ErrMissingProducerId);
        }
        if options.kind != RtpCodecKind::Audio && options.kind != RtpCodecKind::Video {
            return Err(Error::ErrInvalidMediaKind(options.kind.to_string()));
        }

        self.inner.ensure_connect_listener()?;

        let mut rtp_parameters = options.rtp_parameters.clone();
        if !self
            .inner
            .ortc
            .can_receive(&mut rtp_parameters, &self.inner.extended_rtp_capabilities)?
        {
            return Err(Error::ErrCannotConsume);
        }

        Ok(rtp_parameters)
    }

    /// Opens an outgoing data channel. The application answers the
    /// resulting `producedata` request with the id assigned by the SFU.
    pub async fn produce_data(&self, options: DataProducerOptions) -> Result<DataProducer> {
        debug!("produce_data() [label:{}]", options.label);

        self.inner.ensure_usable(TransportDirection::Send)?;
        self.inner.ensure_sctp_enabled()?;
        self.inner.ensure_connect_listener()?;
        if !self.inner.state.lock().listeners.produce_data.is_listening() {
            return Err(Error::ErrNoProduceDataListener);
        }

        let DataProducerOptions {
            mut ordered,
            max_packet_life_time,
            max_retransmits,
            label,
            protocol,
            app_data,
        } = options;

        if max_packet_life_time.is_some() || max_retransmits.is_some() {
            ordered = false;
        }

        let init = RTCDataChannelInit {
            ordered,
            max_packet_life_time,
            max_retransmits,
            label,
            protocol,
            id: None,
        };

        let inner = Arc::clone(&self.inner);
        self.inner
            .queue
            .push("produce_data()", async move {
                inner.produce_data_in_queue(init, app_data).await
            })
            .await
    }

    /// Opens the data channel of a remote data producer.
    pub async fn consume_data(&self, mut options: DataConsumerOptions) -> Result<DataConsumer> {
        debug!(
            "consume_data() [id:{}, data_producer_id:{}]",
            options.id, options.data_producer_id
        );

        self.inner.ensure_usable(TransportDirection::Recv)?;
        self.inner.ensure_sctp_enabled()?;

        if options.id.is_empty() {
            return Err(Error::ErrMissingId);
        }
        if options.data_producer_id.is_empty() {
            return Err(Error::ErrMissingDataProducerId);
        }

        self.inner.ensure_connect_listener()?;

        self.inner
            .ortc
            .validate_sctp_stream_parameters(&mut options.sctp_stream_parameters)?;

        let inner = Arc::clone(&self.inner);
        self.inner
            .queue
            .push("consume_data()", async move {
                inner.consume_data_in_queue(options).await
            })
            .await
    }

    /// Names of the tasks in the transport's queue, for diagnostics.
    pub fn dump_queue(&self) -> crate::serial_queue::QueueDump {
        let dump = self.inner.queue.dump();
        trace!("dump_queue() {dump:?}");
        dump
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Transport")
            .field("id", &self.inner.id)
            .field("direction", &self.inner.direction)
            .field("closed", &state.closed)
            .field("connection_state", &state.connection_state)
            .field("ice_gathering_state", &state.ice_gathering_state)
            .finish_non_exhaustive()
    }
}
