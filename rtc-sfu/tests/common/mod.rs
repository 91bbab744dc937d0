#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use rtc_sfu::consumer::ConsumerOptions;
use rtc_sfu::data_channel::{DataChannel, RTCDataChannelId, RTCDataChannelInit, RTCDataChannelState};
use rtc_sfu::handler::{
    Handler, HandlerEvents, HandlerReceiveDataChannelOptions, HandlerReceiveDataChannelResult,
    HandlerReceiveOptions, HandlerReceiveResult, HandlerRunOptions, HandlerSendDataChannelResult,
    HandlerSendOptions, HandlerSendResult,
};
use rtc_sfu::media_stream::MediaStreamTrack;
use rtc_sfu::rtp_parameters::{
    ExtendedRtpCapabilities, ExtendedRtpCodec, RTCRtpCodecParameters, RTCRtpEncodingParameters,
    RTCRtpParameters, RtpCodecKind,
};
use rtc_sfu::sctp_parameters::{SctpParameters, SctpStreamParameters};
use rtc_sfu::shared::error::{Error, Result};
use rtc_sfu::stats::RTCStatsReport;
use rtc_sfu::transport::configuration::TransportOptionsBuilder;
use rtc_sfu::transport::dtls::RTCDtlsParameters;
use rtc_sfu::transport::ice::{RTCIceParameters, RTCIceServer};
use rtc_sfu::transport::state::RTCConnectionState;
use rtc_sfu::transport::{RTCTransportEvent, TransportDirection};
use rtc_sfu::Transport;

pub const OPUS_PAYLOAD_TYPE: u8 = 100;
pub const VP8_PAYLOAD_TYPE: u8 = 101;

pub fn init_log() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Lets spawned tasks (batch flushes, relays, queue drains) run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// A handler recording every call it receives.
///
/// The first `send`, `send_data_channel`, `receive` or
/// `receive_data_channel` asks the transport to connect, like a real
/// handler does before starting DTLS.
#[derive(Default)]
pub struct MockHandler {
    calls: Mutex<Vec<String>>,
    receive_batches: Mutex<Vec<Vec<HandlerReceiveOptions>>>,
    receive_data_channel_options: Mutex<Vec<HandlerReceiveDataChannelOptions>>,
    events: Mutex<Option<HandlerEvents>>,
    connected: AtomicBool,
    next_local_id: AtomicUsize,
    next_stream_id: AtomicUsize,
    pub data_channels: Mutex<Vec<Arc<MockDataChannel>>>,
    pub fail_send: AtomicBool,
    pub fail_receive: AtomicBool,
    pub fail_probator: AtomicBool,
    pub fail_pause_receiving: AtomicBool,
    pub receive_result_shortfall: AtomicBool,
    pub send_delay: Mutex<Option<Duration>>,
    pub closed: AtomicBool,
}

impl MockHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn receive_batches(&self) -> Vec<Vec<HandlerReceiveOptions>> {
        self.receive_batches.lock().clone()
    }

    pub fn receive_data_channel_options(&self) -> Vec<HandlerReceiveDataChannelOptions> {
        self.receive_data_channel_options.lock().clone()
    }

    pub fn events(&self) -> HandlerEvents {
        self.events
            .lock()
            .clone()
            .expect("handler not started")
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn next_local_id(&self) -> String {
        self.next_local_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    async fn ensure_connected(&self) -> Result<()> {
        if self.connected.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let events = self.events();
        events.connection_state_change(RTCConnectionState::Connecting);
        if let Err(err) = events.connect(RTCDtlsParameters::default()).await {
            self.connected.store(false, Ordering::SeqCst);
            return Err(err);
        }
        self.record("connect");
        events.connection_state_change(RTCConnectionState::Connected);

        Ok(())
    }
}

#[async_trait]
impl Handler for MockHandler {
    fn name(&self) -> String {
        "MockHandler".to_owned()
    }

    fn run(&self, options: HandlerRunOptions) -> Result<()> {
        self.record(format!("run {}", options.direction));
        *self.events.lock() = Some(options.events);
        Ok(())
    }

    fn close(&self) {
        self.record("close");
        self.closed.store(true, Ordering::SeqCst);
    }

    async fn get_transport_stats(&self) -> Result<RTCStatsReport> {
        self.record("get_transport_stats");
        let mut report = RTCStatsReport::new();
        report.insert("transport", serde_json::json!({"type": "transport"}));
        Ok(report)
    }

    async fn update_ice_servers(&self, ice_servers: Vec<RTCIceServer>) -> Result<()> {
        self.record(format!("update_ice_servers {}", ice_servers.len()));
        Ok(())
    }

    async fn restart_ice(&self, ice_parameters: RTCIceParameters) -> Result<()> {
        self.record(format!("restart_ice {}", ice_parameters.username_fragment));
        Ok(())
    }

    async fn send(&self, options: HandlerSendOptions) -> Result<HandlerSendResult> {
        self.ensure_connected().await?;

        let label = options.track.label().to_owned();
        self.record(format!("send start {label}"));

        let delay = *self.send_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_send.load(Ordering::SeqCst) {
            self.record(format!("send failed {label}"));
            return Err(Error::ErrHandler("send failed".to_owned()));
        }

        let local_id = self.next_local_id();
        self.record(format!("send end {label}"));

        Ok(HandlerSendResult {
            local_id,
            rtp_parameters: RTCRtpParameters {
                codecs: vec![codec(options.track.kind())],
                encodings: options
                    .encodings
                    .unwrap_or_else(|| vec![RTCRtpEncodingParameters::default()]),
                ..Default::default()
            },
            rtp_sender: None,
        })
    }

    async fn stop_sending(&self, local_id: &str) -> Result<()> {
        self.record(format!("stop_sending {local_id}"));
        Ok(())
    }

    async fn pause_sending(&self, local_id: &str) -> Result<()> {
        self.record(format!("pause_sending {local_id}"));
        Ok(())
    }

    async fn resume_sending(&self, local_id: &str) -> Result<()> {
        self.record(format!("resume_sending {local_id}"));
        Ok(())
    }

    async fn replace_track(&self, local_id: &str, track: Option<MediaStreamTrack>) -> Result<()> {
        let label = track.map(|track| track.label().to_owned()).unwrap_or_default();
        self.record(format!("replace_track {local_id} {label}"));
        Ok(())
    }

    async fn set_max_spatial_layer(&self, local_id: &str, spatial_layer: u8) -> Result<()> {
        self.record(format!("set_max_spatial_layer {local_id} {spatial_layer}"));
        Ok(())
    }

    async fn set_rtp_encoding_parameters(
        &self,
        local_id: &str,
        _params: RTCRtpEncodingParameters,
    ) -> Result<()> {
        self.record(format!("set_rtp_encoding_parameters {local_id}"));
        Ok(())
    }

    async fn get_sender_stats(&self, local_id: &str) -> Result<RTCStatsReport> {
        self.record(format!("get_sender_stats {local_id}"));
        Ok(RTCStatsReport::new())
    }

    async fn send_data_channel(
        &self,
        options: RTCDataChannelInit,
    ) -> Result<HandlerSendDataChannelResult> {
        self.ensure_connected().await?;
        self.record(format!("send_data_channel {}", options.label));

        let stream_id = self.next_stream_id.fetch_add(1, Ordering::SeqCst) as u16;
        let data_channel = MockDataChannel::new(stream_id, &options.label, &options.protocol);
        self.data_channels.lock().push(Arc::clone(&data_channel));

        Ok(HandlerSendDataChannelResult {
            data_channel,
            sctp_stream_parameters: SctpStreamParameters {
                stream_id,
                ordered: Some(options.ordered),
                max_packet_life_time: options.max_packet_life_time,
                max_retransmits: options.max_retransmits,
            },
        })
    }

    async fn receive(
        &self,
        options_list: Vec<HandlerReceiveOptions>,
    ) -> Result<Vec<HandlerReceiveResult>> {
        self.ensure_connected().await?;

        let track_ids = options_list
            .iter()
            .map(|options| options.track_id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.record(format!("receive {track_ids}"));
        self.receive_batches.lock().push(options_list.clone());

        let probator = options_list
            .iter()
            .any(|options| options.track_id == "probator");
        if probator && self.fail_probator.load(Ordering::SeqCst) {
            return Err(Error::ErrHandler("probator failed".to_owned()));
        }
        if !probator && self.fail_receive.load(Ordering::SeqCst) {
            return Err(Error::ErrHandler("receive failed".to_owned()));
        }

        let mut results = options_list
            .into_iter()
            .map(|options| HandlerReceiveResult {
                local_id: self.next_local_id(),
                track: MediaStreamTrack::with_id(options.track_id, options.kind, "remote"),
                rtp_receiver: None,
            })
            .collect::<Vec<_>>();
        if self.receive_result_shortfall.load(Ordering::SeqCst) {
            results.pop();
        }

        Ok(results)
    }

    async fn stop_receiving(&self, local_ids: Vec<String>) -> Result<()> {
        self.record(format!("stop_receiving {}", local_ids.join(",")));
        Ok(())
    }

    async fn pause_receiving(&self, local_ids: Vec<String>) -> Result<()> {
        self.record(format!("pause_receiving {}", local_ids.join(",")));
        if self.fail_pause_receiving.load(Ordering::SeqCst) {
            return Err(Error::ErrHandler("pause failed".to_owned()));
        }
        Ok(())
    }

    async fn resume_receiving(&self, local_ids: Vec<String>) -> Result<()> {
        self.record(format!("resume_receiving {}", local_ids.join(",")));
        Ok(())
    }

    async fn get_receiver_stats(&self, local_id: &str) -> Result<RTCStatsReport> {
        self.record(format!("get_receiver_stats {local_id}"));
        Ok(RTCStatsReport::new())
    }

    async fn receive_data_channel(
        &self,
        options: HandlerReceiveDataChannelOptions,
    ) -> Result<HandlerReceiveDataChannelResult> {
        self.ensure_connected().await?;
        self.record(format!("receive_data_channel {}", options.label));
        self.receive_data_channel_options.lock().push(options.clone());

        let data_channel = MockDataChannel::new(
            options.sctp_stream_parameters.stream_id,
            &options.label,
            &options.protocol,
        );
        self.data_channels.lock().push(Arc::clone(&data_channel));

        Ok(HandlerReceiveDataChannelResult { data_channel })
    }
}

pub struct MockDataChannel {
    id: RTCDataChannelId,
    label: String,
    protocol: String,
    state: Mutex<RTCDataChannelState>,
    pub sent: Mutex<Vec<Bytes>>,
}

impl MockDataChannel {
    pub fn new(id: RTCDataChannelId, label: &str, protocol: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            label: label.to_owned(),
            protocol: protocol.to_owned(),
            state: Mutex::new(RTCDataChannelState::Open),
            sent: Mutex::new(vec![]),
        })
    }
}

impl DataChannel for MockDataChannel {
    fn id(&self) -> RTCDataChannelId {
        self.id
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn protocol(&self) -> String {
        self.protocol.clone()
    }

    fn ready_state(&self) -> RTCDataChannelState {
        *self.state.lock()
    }

    fn send(&self, data: Bytes) -> Result<()> {
        if self.ready_state() != RTCDataChannelState::Open {
            return Err(Error::ErrDataChannelClosed);
        }
        self.sent.lock().push(data);
        Ok(())
    }

    fn send_text(&self, text: String) -> Result<()> {
        self.send(Bytes::from(text))
    }

    fn close(&self) {
        *self.state.lock() = RTCDataChannelState::Closed;
    }
}

pub fn codec(kind: RtpCodecKind) -> RTCRtpCodecParameters {
    match kind {
        RtpCodecKind::Video => RTCRtpCodecParameters {
            mime_type: "video/VP8".to_owned(),
            payload_type: VP8_PAYLOAD_TYPE,
            clock_rate: 90000,
            ..Default::default()
        },
        _ => RTCRtpCodecParameters {
            mime_type: "audio/opus".to_owned(),
            payload_type: OPUS_PAYLOAD_TYPE,
            clock_rate: 48000,
            channels: Some(2),
            ..Default::default()
        },
    }
}

/// Opus and VP8, same payload types on both sides.
pub fn extended_rtp_capabilities() -> ExtendedRtpCapabilities {
    ExtendedRtpCapabilities {
        codecs: vec![
            ExtendedRtpCodec {
                kind: RtpCodecKind::Audio,
                mime_type: "audio/opus".to_owned(),
                clock_rate: 48000,
                channels: Some(2),
                local_payload_type: OPUS_PAYLOAD_TYPE,
                remote_payload_type: OPUS_PAYLOAD_TYPE,
                ..Default::default()
            },
            ExtendedRtpCodec {
                kind: RtpCodecKind::Video,
                mime_type: "video/VP8".to_owned(),
                clock_rate: 90000,
                local_payload_type: VP8_PAYLOAD_TYPE,
                remote_payload_type: VP8_PAYLOAD_TYPE,
                ..Default::default()
            },
        ],
        header_extensions: vec![],
    }
}

pub fn transport_options_builder(direction: TransportDirection) -> TransportOptionsBuilder {
    TransportOptionsBuilder::new(format!("{direction}-transport"), direction)
        .with_ice_parameters(RTCIceParameters {
            username_fragment: "ufrag".to_owned(),
            password: "password".to_owned(),
            ice_lite: true,
        })
        .with_sctp_parameters(SctpParameters {
            port: 5000,
            os: 1024,
            mis: 1024,
            max_message_size: 262144,
        })
        .with_extended_rtp_capabilities(extended_rtp_capabilities())
}

pub fn new_transport(direction: TransportDirection) -> (Transport, Arc<MockHandler>) {
    let handler = MockHandler::new();
    let transport = Transport::new(
        transport_options_builder(direction).build(),
        Arc::clone(&handler) as Arc<dyn Handler>,
    )
    .expect("transport");
    (transport, handler)
}

/// Accepts every `connect` request.
pub fn accept_connect(transport: &Transport) {
    let mut requests = transport.on_connect();
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            request.accept();
        }
    });
}

/// Accepts every `produce` request with ids `producer-0`, `producer-1`, ...
pub fn accept_produce(transport: &Transport) {
    let mut requests = transport.on_produce();
    tokio::spawn(async move {
        let mut n = 0;
        while let Some(request) = requests.recv().await {
            request.accept(format!("producer-{n}"));
            n += 1;
        }
    });
}

/// Rejects every `produce` request.
pub fn reject_produce(transport: &Transport) {
    let mut requests = transport.on_produce();
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            request.reject(Error::Other("rejected by signaling".to_owned()));
        }
    });
}

/// Accepts every `producedata` request with ids `data-producer-0`, ...
pub fn accept_produce_data(transport: &Transport) {
    let mut requests = transport.on_produce_data();
    tokio::spawn(async move {
        let mut n = 0;
        while let Some(request) = requests.recv().await {
            request.accept(format!("data-producer-{n}"));
            n += 1;
        }
    });
}

/// A sending transport with every request answered.
pub fn send_transport() -> (Transport, Arc<MockHandler>) {
    let (transport, handler) = new_transport(TransportDirection::Send);
    accept_connect(&transport);
    accept_produce(&transport);
    accept_produce_data(&transport);
    (transport, handler)
}

/// A receiving transport with `connect` answered.
pub fn recv_transport() -> (Transport, Arc<MockHandler>) {
    let (transport, handler) = new_transport(TransportDirection::Recv);
    accept_connect(&transport);
    (transport, handler)
}

pub fn consumer_options(id: &str, kind: RtpCodecKind) -> ConsumerOptions {
    ConsumerOptions {
        id: id.to_owned(),
        producer_id: format!("remote-{id}"),
        kind,
        rtp_parameters: RTCRtpParameters {
            codecs: vec![codec(kind)],
            encodings: vec![RTCRtpEncodingParameters {
                ssrc: Some(1111),
                ..Default::default()
            }],
            ..Default::default()
        },
        stream_id: None,
        ..Default::default()
    }
}

/// Drains the events received so far.
pub fn drain_events(events: &mut broadcast::Receiver<RTCTransportEvent>) -> Vec<RTCTransportEvent> {
    let mut drained = vec![];
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
