mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;

use common::*;
use rtc_sfu::handler::Handler;
use rtc_sfu::media_stream::{MediaStreamTrack, MediaStreamTrackState};
use rtc_sfu::producer::ProducerOptions;
use rtc_sfu::rtp_parameters::{CanProduceByKind, RTCRtpEncodingParameters, RtpCodecKind};
use rtc_sfu::shared::error::{Error, ErrorKind};
use rtc_sfu::transport::state::RTCConnectionState;
use rtc_sfu::transport::{RTCTransportEvent, TransportDirection};
use rtc_sfu::Transport;

#[tokio::test]
async fn test_produce() -> Result<()> {
    init_log();

    let (transport, handler) = send_transport();
    let mut events = transport.subscribe();

    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let producer = transport.produce(ProducerOptions::new(track.clone())).await?;

    assert_eq!(producer.id(), "producer-0");
    assert_eq!(producer.local_id(), "0");
    assert_eq!(producer.kind(), RtpCodecKind::Audio);
    assert_eq!(producer.track(), Some(track));
    assert!(!producer.paused());
    assert_eq!(producer.rtp_parameters().rtcp.reduced_size, Some(true));
    assert!(transport.get_producer("producer-0").is_some());
    assert_eq!(transport.connection_state(), RTCConnectionState::Connected);

    assert_eq!(
        handler.calls(),
        vec!["run send", "connect", "send start mic", "send end mic"]
    );

    let new_producers = drain_events(&mut events)
        .into_iter()
        .filter(|event| matches!(event, RTCTransportEvent::OnNewProducer(_)))
        .count();
    assert_eq!(new_producers, 1);

    Ok(())
}

#[tokio::test]
async fn test_produce_preconditions() -> Result<()> {
    init_log();

    let (send, handler) = send_transport();

    let err = send.produce(ProducerOptions::default()).await.err();
    assert_eq!(err, Some(Error::ErrMissingTrack));
    assert_eq!(err.map(|err| err.kind()), Some(ErrorKind::Type));

    let ended = MediaStreamTrack::new(RtpCodecKind::Audio, "ended");
    ended.stop();
    let err = send.produce(ProducerOptions::new(ended)).await.err();
    assert_eq!(err, Some(Error::ErrTrackEnded));

    let (recv, _) = recv_transport();
    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let err = recv.produce(ProducerOptions::new(track)).await.err();
    assert_eq!(err, Some(Error::ErrNotSendingTransport));

    assert_eq!(handler.calls(), vec!["run send"]);

    Ok(())
}

#[tokio::test]
async fn test_produce_requires_listeners() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Send);

    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let err = transport
        .produce(ProducerOptions::new(track.clone()))
        .await
        .err();
    assert_eq!(err, Some(Error::ErrNoConnectListener));

    accept_connect(&transport);
    let err = transport
        .produce(ProducerOptions::new(track.clone()))
        .await
        .err();
    assert_eq!(err, Some(Error::ErrNoProduceListener));

    assert_eq!(handler.calls(), vec!["run send"]);
    assert_eq!(track.ready_state(), MediaStreamTrackState::Live);

    Ok(())
}

#[tokio::test]
async fn test_produce_unsupported_kind() -> Result<()> {
    init_log();

    let handler = MockHandler::new();
    let options = transport_options_builder(TransportDirection::Send)
        .with_can_produce_by_kind(CanProduceByKind {
            audio: true,
            video: false,
        })
        .build();
    let transport = Transport::new(options, Arc::clone(&handler) as Arc<dyn Handler>)?;
    accept_connect(&transport);
    accept_produce(&transport);

    let track = MediaStreamTrack::new(RtpCodecKind::Video, "cam");
    let err = transport.produce(ProducerOptions::new(track)).await.err();
    assert_eq!(err, Some(Error::ErrCannotProduce("video".to_owned())));
    assert_eq!(err.map(|err| err.kind()), Some(ErrorKind::Unsupported));
    assert!(handler.calls_starting_with("send").is_empty());

    // an ended track is reported before the kind is looked at
    let ended = MediaStreamTrack::new(RtpCodecKind::Video, "ended");
    ended.stop();
    let err = transport.produce(ProducerOptions::new(ended)).await.err();
    assert_eq!(err, Some(Error::ErrTrackEnded));

    Ok(())
}

#[tokio::test]
async fn test_produce_rolls_back_when_signaling_rejects() -> Result<()> {
    init_log();

    let (transport, handler) = new_transport(TransportDirection::Send);
    accept_connect(&transport);
    reject_produce(&transport);

    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let err = transport
        .produce(ProducerOptions::new(track.clone()))
        .await
        .err();

    assert_eq!(err, Some(Error::Other("rejected by signaling".to_owned())));
    assert_eq!(handler.calls_starting_with("stop_sending"), vec!["stop_sending 0"]);
    assert_eq!(track.ready_state(), MediaStreamTrackState::Ended);
    assert!(transport.producers().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_produce_failure_keeps_track_without_stop_tracks() -> Result<()> {
    init_log();

    let (transport, handler) = send_transport();
    handler.fail_send.store(true, Ordering::SeqCst);

    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let err = transport
        .produce(ProducerOptions {
            stop_tracks: false,
            ..ProducerOptions::new(track.clone())
        })
        .await
        .err();

    assert_eq!(err, Some(Error::ErrHandler("send failed".to_owned())));
    assert!(handler.calls_starting_with("stop_sending").is_empty());
    assert_eq!(track.ready_state(), MediaStreamTrackState::Live);

    Ok(())
}

#[tokio::test]
async fn test_produce_normalizes_encodings() -> Result<()> {
    init_log();

    let (transport, _) = send_transport();

    let track = MediaStreamTrack::new(RtpCodecKind::Video, "cam");
    let producer = transport
        .produce(ProducerOptions {
            encodings: vec![
                RTCRtpEncodingParameters {
                    rid: Some("r0".to_owned()),
                    max_bitrate: Some(100_000),
                    scale_resolution_down_by: Some(4.0),
                    ..Default::default()
                },
                RTCRtpEncodingParameters {
                    active: Some(false),
                    scale_resolution_down_by: Some(0.5),
                    ..Default::default()
                },
            ],
            ..ProducerOptions::new(track)
        })
        .await?;

    let encodings = &producer.rtp_parameters().encodings;
    assert_eq!(encodings.len(), 2);
    assert_eq!(
        encodings[0],
        RTCRtpEncodingParameters {
            active: Some(true),
            max_bitrate: Some(100_000),
            scale_resolution_down_by: Some(4.0),
            ..Default::default()
        }
    );
    assert_eq!(
        encodings[1],
        RTCRtpEncodingParameters {
            active: Some(false),
            ..Default::default()
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_producer_requests_go_through_queue() -> Result<()> {
    init_log();

    let (transport, handler) = send_transport();

    let track = MediaStreamTrack::new(RtpCodecKind::Video, "cam");
    let producer = transport
        .produce(ProducerOptions {
            zero_rtp_on_pause: true,
            ..ProducerOptions::new(track.clone())
        })
        .await?;

    producer.pause().await?;
    assert!(producer.paused());
    assert!(!track.enabled());
    producer.resume().await?;
    assert!(track.enabled());

    let screen = MediaStreamTrack::new(RtpCodecKind::Video, "screen");
    producer.replace_track(Some(screen.clone())).await?;
    assert_eq!(track.ready_state(), MediaStreamTrackState::Ended);
    assert_eq!(producer.track(), Some(screen));

    producer.set_max_spatial_layer(2).await?;
    producer
        .set_rtp_encoding_parameters(RTCRtpEncodingParameters {
            max_bitrate: Some(500_000),
            ..Default::default()
        })
        .await?;
    producer.get_stats().await?;

    assert_eq!(
        handler.calls()[4..],
        [
            "pause_sending 0",
            "resume_sending 0",
            "replace_track 0 screen",
            "set_max_spatial_layer 0 2",
            "set_rtp_encoding_parameters 0",
            "get_sender_stats 0",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_producer_close_stops_sending() -> Result<()> {
    init_log();

    let (transport, handler) = send_transport();

    let track = MediaStreamTrack::new(RtpCodecKind::Audio, "mic");
    let producer = transport.produce(ProducerOptions::new(track.clone())).await?;

    producer.close();
    settle().await;

    assert!(producer.closed());
    assert_eq!(track.ready_state(), MediaStreamTrackState::Ended);
    assert!(transport.producers().is_empty());
    assert_eq!(handler.calls_starting_with("stop_sending"), vec!["stop_sending 0"]);

    assert_eq!(producer.pause().await, Err(Error::ErrProducerClosed));

    Ok(())
}

#[tokio::test]
async fn test_producer_requests_fail_after_transport_close() -> Result<()> {
    init_log();

    let (transport, _) = send_transport();

    let track = MediaStreamTrack::new(RtpCodecKind::Video, "cam");
    let producer = transport.produce(ProducerOptions::new(track)).await?;

    transport.close();

    assert!(producer.closed());
    assert_eq!(producer.get_stats().await.err(), Some(Error::ErrProducerClosed));
    assert_eq!(
        producer.set_max_spatial_layer(1).await,
        Err(Error::ErrProducerClosed)
    );

    Ok(())
}
