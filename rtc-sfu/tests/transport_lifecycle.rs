mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use common::*;
use rtc_sfu::data_consumer::DataConsumerOptions;
use rtc_sfu::data_producer::DataProducerOptions;
use rtc_sfu::handler::Handler;
use rtc_sfu::media_stream::{MediaStreamTrack, MediaStreamTrackState};
use rtc_sfu::producer::ProducerOptions;
use rtc_sfu::rtp_parameters::RtpCodecKind;
use rtc_sfu::shared::error::{Error, ErrorKind};
use rtc_sfu::transport::configuration::TransportOptionsBuilder;
use rtc_sfu::transport::dtls::RTCDtlsParameters;
use rtc_sfu::transport::ice::{RTCIceParameters, RTCIceServer};
use rtc_sfu::transport::state::{RTCConnectionState, RTCIceGatheringState};
use rtc_sfu::transport::{RTCTransportEvent, TransportDirection};
use rtc_sfu::Transport;

#[tokio::test]
async fn test_new_transport_runs_handler() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Send);
    assert_eq!(transport.id(), "send-transport");
    assert_eq!(transport.direction(), TransportDirection::Send);
    assert_eq!(transport.connection_state(), RTCConnectionState::New);
    assert_eq!(transport.ice_gathering_state(), RTCIceGatheringState::New);
    assert_eq!(transport.max_sctp_message_size(), Some(262144));
    assert!(!transport.closed());
    assert_eq!(handler.calls(), vec!["run send"]);

    Ok(())
}

#[tokio::test]
async fn test_new_transport_rejects_invalid_options() {
    init_log();

    let options = TransportOptionsBuilder::new("t", TransportDirection::Recv).build();
    let result = Transport::new(options, MockHandler::new() as Arc<dyn Handler>);
    assert_eq!(result.err(), Some(Error::ErrMissingIceParameters));

    let options = TransportOptionsBuilder::new("", TransportDirection::Recv)
        .with_ice_parameters(RTCIceParameters {
            username_fragment: "u".to_owned(),
            password: "p".to_owned(),
            ice_lite: false,
        })
        .build();
    let result = Transport::new(options, MockHandler::new() as Arc<dyn Handler>);
    assert_eq!(result.err(), Some(Error::ErrMissingId));
}

#[tokio::test]
async fn test_close_is_idempotent() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Recv);
    let mut events = transport.subscribe();

    transport.close();
    transport.close();

    assert!(transport.closed());
    assert_eq!(transport.connection_state(), RTCConnectionState::Closed);
    assert_eq!(handler.calls_starting_with("close").len(), 1);

    let closes = drain_events(&mut events)
        .into_iter()
        .filter(|event| matches!(event, RTCTransportEvent::OnClose))
        .count();
    assert_eq!(closes, 1);

    Ok(())
}

#[tokio::test]
async fn test_operations_after_close_fail() -> Result<()> {
    init_log();

    let (send, _) = send_transport();
    send.close();

    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let err = send.produce(ProducerOptions::new(track)).await.err();
    assert_eq!(err, Some(Error::ErrTransportClosed));
    assert_eq!(err.map(|err| err.kind()), Some(ErrorKind::InvalidState));

    let err = send
        .produce_data(DataProducerOptions::default())
        .await
        .err();
    assert_eq!(err, Some(Error::ErrTransportClosed));
    assert_eq!(send.get_stats().await.err(), Some(Error::ErrTransportClosed));
    assert_eq!(
        send.restart_ice(RTCIceParameters::default()).await.err(),
        Some(Error::ErrTransportClosed)
    );
    assert_eq!(
        send.update_ice_servers(vec![]).await.err(),
        Some(Error::ErrTransportClosed)
    );

    let (recv, _) = recv_transport();
    recv.close();

    let err = recv
        .consume(consumer_options("c1", RtpCodecKind::Audio))
        .await
        .err();
    assert_eq!(err, Some(Error::ErrTransportClosed));
    let err = recv
        .consume_data(DataConsumerOptions {
            id: "dc1".to_owned(),
            data_producer_id: "dp1".to_owned(),
            ..Default::default()
        })
        .await
        .err();
    assert_eq!(err, Some(Error::ErrTransportClosed));

    assert!(send.producers().is_empty());
    assert!(send.data_producers().is_empty());
    assert!(recv.consumers().is_empty());
    assert!(recv.data_consumers().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_state_changes_are_forwarded_once() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Send);
    let mut events = transport.subscribe();
    let handler_events = handler.events();

    handler_events.ice_gathering_state_change(RTCIceGatheringState::Gathering);
    handler_events.ice_gathering_state_change(RTCIceGatheringState::Gathering);
    handler_events.ice_gathering_state_change(RTCIceGatheringState::Complete);
    handler_events.connection_state_change(RTCConnectionState::Connecting);
    handler_events.connection_state_change(RTCConnectionState::Connecting);
    handler_events.connection_state_change(RTCConnectionState::Connected);

    let events = drain_events(&mut events);
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events[0],
        RTCTransportEvent::OnIceGatheringStateChangeEvent(RTCIceGatheringState::Gathering)
    ));
    assert!(matches!(
        events[1],
        RTCTransportEvent::OnIceGatheringStateChangeEvent(RTCIceGatheringState::Complete)
    ));
    assert!(matches!(
        events[2],
        RTCTransportEvent::OnConnectionStateChangeEvent(RTCConnectionState::Connecting)
    ));
    assert!(matches!(
        events[3],
        RTCTransportEvent::OnConnectionStateChangeEvent(RTCConnectionState::Connected)
    ));
    assert_eq!(transport.connection_state(), RTCConnectionState::Connected);
    assert_eq!(transport.ice_gathering_state(), RTCIceGatheringState::Complete);

    Ok(())
}

#[tokio::test]
async fn test_no_state_changes_after_close() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Send);
    let handler_events = handler.events();
    let mut events = transport.subscribe();

    transport.close();
    handler_events.connection_state_change(RTCConnectionState::Failed);
    handler_events.ice_gathering_state_change(RTCIceGatheringState::Gathering);

    assert_eq!(transport.connection_state(), RTCConnectionState::Closed);
    assert_eq!(transport.ice_gathering_state(), RTCIceGatheringState::New);

    let events = drain_events(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], RTCTransportEvent::OnClose));

    Ok(())
}

#[tokio::test]
async fn test_connect_request_after_close_is_rejected() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Send);
    let mut connect = transport.on_connect();
    let handler_events = handler.events();

    transport.close();

    let result = handler_events.connect(RTCDtlsParameters::default()).await;
    assert_eq!(result, Err(Error::ErrTransportClosed));
    assert!(connect.recv().await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_connect_request_relayed() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Send);
    let mut connect = transport.on_connect();
    let handler_events = handler.events();

    let (result, _) = tokio::join!(
        handler_events.connect(RTCDtlsParameters::default()),
        async {
            let request = connect.recv().await.expect("connect request");
            request.reject(Error::Other("signaling down".to_owned()));
        }
    );
    assert_eq!(result, Err(Error::Other("signaling down".to_owned())));

    drop(connect);
    let result = handler_events.connect(RTCDtlsParameters::default()).await;
    assert_eq!(result, Err(Error::ErrNoConnectListener));

    Ok(())
}

#[tokio::test]
async fn test_close_tears_down_entities() -> Result<()> {
    init_log();

    let (send, send_handler) = send_transport();
    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let producer = send.produce(ProducerOptions::new(track.clone())).await?;
    let data_producer = send.produce_data(DataProducerOptions::default()).await?;

    let (recv, _) = recv_transport();
    let consumer = recv
        .consume(consumer_options("c1", RtpCodecKind::Audio))
        .await?;

    send.close();
    recv.close();
    settle().await;

    assert!(producer.closed());
    assert!(data_producer.closed());
    assert!(consumer.closed());
    assert_eq!(track.ready_state(), MediaStreamTrackState::Ended);
    assert_eq!(
        consumer.track().ready_state(),
        MediaStreamTrackState::Ended
    );
    assert!(send_handler.calls_starting_with("stop_sending").is_empty());
    assert!(send.producers().is_empty());
    assert!(recv.consumers().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_close_rejects_pending_consumer_creation() -> Result<()> {
    init_log();

    let (transport, handler) = recv_transport();

    let (result, _) = tokio::join!(
        transport.consume(consumer_options("c1", RtpCodecKind::Audio)),
        async { transport.close() }
    );
    assert_eq!(result.err(), Some(Error::ErrTransportClosed));

    settle().await;
    assert!(handler.calls_starting_with("receive").is_empty());
    assert!(transport.consumers().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_queue_runs_operations_in_order() -> Result<()> {
    init_log();

    let (transport, handler) = send_transport();
    *handler.send_delay.lock() = Some(Duration::from_millis(30));

    let slow = MediaStreamTrack::new(RtpCodecKind::Audio, "a");
    let fast = MediaStreamTrack::new(RtpCodecKind::Audio, "b");

    let (a, b) = tokio::join!(
        transport.produce(ProducerOptions::new(slow)),
        transport.produce(ProducerOptions::new(fast))
    );
    assert_eq!(a?.id(), "producer-0");
    assert_eq!(b?.id(), "producer-1");

    assert_eq!(
        handler.calls_starting_with("send"),
        vec!["send start a", "send end a", "send start b", "send end b"]
    );

    Ok(())
}

#[tokio::test]
async fn test_close_stops_queued_operations() -> Result<()> {
    init_log();

    let (transport, handler) = send_transport();
    *handler.send_delay.lock() = Some(Duration::from_millis(30));

    let (first, second, _) = tokio::join!(
        transport.produce(ProducerOptions::new(MediaStreamTrack::new(
            RtpCodecKind::Audio,
            "a"
        ))),
        transport.produce(ProducerOptions::new(MediaStreamTrack::new(
            RtpCodecKind::Audio,
            "b"
        ))),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            transport.close();
        }
    );

    // the running task settles against a closed transport
    assert!(first.is_err());
    assert_eq!(second.err(), Some(Error::ErrQueueStopped));
    assert!(handler.calls_starting_with("send start b").is_empty());
    assert!(transport.producers().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_stats_restart_ice_and_update_ice_servers() -> Result<()> {
    init_log();

    let (transport, handler) = send_transport();

    let stats = transport.get_stats().await?;
    assert!(stats.get("transport").is_some());

    assert_eq!(
        transport.restart_ice(RTCIceParameters::default()).await,
        Err(Error::ErrMissingIceParameters)
    );
    transport
        .restart_ice(RTCIceParameters {
            username_fragment: "ufrag2".to_owned(),
            password: "password2".to_owned(),
            ice_lite: true,
        })
        .await?;

    transport
        .update_ice_servers(vec![RTCIceServer {
            urls: vec!["stun:stun.example.org:3478?transport=udp".to_owned()],
            ..Default::default()
        }])
        .await?;

    assert_eq!(
        handler.calls(),
        vec![
            "run send",
            "get_transport_stats",
            "restart_ice ufrag2",
            "update_ice_servers 1"
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_dropping_transport_closes_it() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Recv);
    drop(transport);
    assert!(handler.closed.load(Ordering::SeqCst));

    Ok(())
}

#[tokio::test]
async fn test_app_data() -> Result<()> {
    init_log();

    let (transport, _) = new_transport(TransportDirection::Send);
    assert!(transport.app_data().is::<()>());

    transport.set_app_data(rtc_sfu::app_data::AppData::new(42u32));
    assert_eq!(transport.app_data().downcast_ref::<u32>(), Some(&42));

    Ok(())
}
