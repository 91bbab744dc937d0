//! Bridges entity lifecycle requests into the transport.
//!
//! Each entity is created with a listener closure holding the transport
//! weakly. Requests that renegotiate are pushed onto the transport's queue
//! (or, for consumers, into a pending batch); stats queries go straight to
//! the handler.

use std::future::Future;
use std::sync::{Arc, Weak};

use log::{debug, warn};
use shared::error::{Error, Result};

use crate::consumer::{ConsumerListener, ConsumerRequest};
use crate::data_channel::DataChannel;
use crate::data_producer::CloseListener;
use crate::handler::Handler;
use crate::producer::{ProducerListener, ProducerRequest};
use crate::transport::batch::{self, CloseConsumers, PauseConsumers, ResumeConsumers};
use crate::transport::request::Responder;
use crate::transport::TransportInner;

/// Pushes the handler call built by `task` and relays its outcome.
fn push_and_relay<T, F, Fut>(
    transport: &TransportInner,
    name: &str,
    responder: Responder<T>,
    task: F,
) where
    T: Send + 'static,
    F: FnOnce(Arc<dyn Handler>) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let outcome = transport
        .queue
        .push(name, task(Arc::clone(&transport.handler)));
    transport
        .runtime
        .spawn(async move { responder.respond(outcome.await) });
}

pub(crate) fn producer_listener(
    transport: &Arc<TransportInner>,
    id: String,
    local_id: String,
) -> ProducerListener {
    let transport = Arc::downgrade(transport);
    Box::new(move |request| on_producer_request(&transport, &id, &local_id, request))
}

fn on_producer_request(
    transport: &Weak<TransportInner>,
    id: &str,
    local_id: &str,
    request: ProducerRequest,
) {
    let Some(transport) = transport.upgrade() else {
        reject_producer_request(request);
        return;
    };

    let local_id = local_id.to_owned();
    match request {
        ProducerRequest::Close => {
            let closed = {
                let mut state = transport.state.lock();
                state.producers.remove(id);
                state.closed
            };
            if closed {
                return;
            }

            let handler = Arc::clone(&transport.handler);
            let outcome = transport
                .queue
                .push("producer.close()", async move {
                    handler.stop_sending(&local_id).await
                });
            transport.runtime.spawn(async move {
                if let Err(err) = outcome.await {
                    warn!("producer.close() | stop_sending() failed: {err}");
                }
            });
        }
        ProducerRequest::Pause(responder) => {
            push_and_relay(&transport, "producer.pause()", responder, |handler| async move {
                handler.pause_sending(&local_id).await
            });
        }
        ProducerRequest::Resume(responder) => {
            push_and_relay(&transport, "producer.resume()", responder, |handler| async move {
                handler.resume_sending(&local_id).await
            });
        }
        ProducerRequest::ReplaceTrack(track, responder) => {
            push_and_relay(
                &transport,
                "producer.replace_track()",
                responder,
                |handler| async move { handler.replace_track(&local_id, track).await },
            );
        }
        ProducerRequest::SetMaxSpatialLayer(spatial_layer, responder) => {
            push_and_relay(
                &transport,
                "producer.set_max_spatial_layer()",
                responder,
                |handler| async move { handler.set_max_spatial_layer(&local_id, spatial_layer).await },
            );
        }
        ProducerRequest::SetRtpEncodingParameters(params, responder) => {
            push_and_relay(
                &transport,
                "producer.set_rtp_encoding_parameters()",
                responder,
                |handler| async move { handler.set_rtp_encoding_parameters(&local_id, params).await },
            );
        }
        ProducerRequest::GetStats(responder) => {
            if transport.state.lock().closed {
                responder.reject(Error::ErrTransportClosed);
                return;
            }
            let handler = Arc::clone(&transport.handler);
            transport.runtime.spawn(async move {
                responder.respond(handler.get_sender_stats(&local_id).await);
            });
        }
    }
}

fn reject_producer_request(request: ProducerRequest) {
    match request {
        ProducerRequest::Close => {}
        ProducerRequest::Pause(responder)
        | ProducerRequest::Resume(responder)
        | ProducerRequest::ReplaceTrack(_, responder)
        | ProducerRequest::SetMaxSpatialLayer(_, responder)
        | ProducerRequest::SetRtpEncodingParameters(_, responder) => {
            responder.reject(Error::ErrTransportClosed)
        }
        ProducerRequest::GetStats(responder) => responder.reject(Error::ErrTransportClosed),
    }
}

pub(crate) fn consumer_listener(
    transport: &Arc<TransportInner>,
    id: String,
    local_id: String,
) -> ConsumerListener {
    let transport = Arc::downgrade(transport);
    Box::new(move |request| on_consumer_request(&transport, &id, &local_id, request))
}

fn on_consumer_request(
    transport: &Weak<TransportInner>,
    id: &str,
    local_id: &str,
    request: ConsumerRequest,
) {
    let Some(transport) = transport.upgrade() else {
        if let ConsumerRequest::GetStats(responder) = request {
            responder.reject(Error::ErrTransportClosed);
        }
        return;
    };

    match request {
        ConsumerRequest::Close => {
            let scheduled = {
                let mut state = transport.state.lock();
                let consumer = state.consumers.remove(id);
                state.batches.pause.items.remove(id);
                state.batches.resume.items.remove(id);

                match consumer {
                    Some(consumer) if !state.closed => {
                        state.batches.close.items.insert(consumer);
                        true
                    }
                    _ => false,
                }
            };
            if scheduled {
                batch::schedule_flush::<CloseConsumers>(&transport);
            }
        }
        ConsumerRequest::Pause => {
            let scheduled = {
                let mut state = transport.state.lock();
                if state.closed {
                    return;
                }
                let Some(consumer) = state.consumers.get(id).cloned() else {
                    return;
                };
                if state.batches.resume.items.remove(id) {
                    debug!("consumer {id} resume still pending, pause cancels it");
                    false
                } else {
                    state.batches.pause.items.insert(consumer);
                    true
                }
            };
            if scheduled {
                batch::schedule_flush::<PauseConsumers>(&transport);
            }
        }
        ConsumerRequest::Resume => {
            let scheduled = {
                let mut state = transport.state.lock();
                if state.closed {
                    return;
                }
                let Some(consumer) = state.consumers.get(id).cloned() else {
                    return;
                };
                if state.batches.pause.items.remove(id) {
                    debug!("consumer {id} pause still pending, resume cancels it");
                    false
                } else {
                    state.batches.resume.items.insert(consumer);
                    true
                }
            };
            if scheduled {
                batch::schedule_flush::<ResumeConsumers>(&transport);
            }
        }
        ConsumerRequest::GetStats(responder) => {
            if transport.state.lock().closed {
                responder.reject(Error::ErrTransportClosed);
                return;
            }
            let handler = Arc::clone(&transport.handler);
            let local_id = local_id.to_owned();
            transport.runtime.spawn(async move {
                responder.respond(handler.get_receiver_stats(&local_id).await);
            });
        }
    }
}

pub(crate) fn data_producer_listener(
    transport: &Arc<TransportInner>,
    id: String,
    data_channel: Arc<dyn DataChannel>,
) -> CloseListener {
    let transport = Arc::downgrade(transport);
    Box::new(move || {
        let closed = match transport.upgrade() {
            Some(transport) => {
                let closed = {
                    let mut state = transport.state.lock();
                    state.data_producers.remove(&id);
                    state.closed
                };
                if !closed {
                    close_data_channel(&transport, "data_producer.close()", &data_channel);
                }
                closed
            }
            None => true,
        };
        if closed {
            data_channel.close();
        }
    })
}

pub(crate) fn data_consumer_listener(
    transport: &Arc<TransportInner>,
    id: String,
    data_channel: Arc<dyn DataChannel>,
) -> CloseListener {
    let transport = Arc::downgrade(transport);
    Box::new(move || {
        let closed = match transport.upgrade() {
            Some(transport) => {
                let closed = {
                    let mut state = transport.state.lock();
                    state.data_consumers.remove(&id);
                    state.closed
                };
                if !closed {
                    close_data_channel(&transport, "data_consumer.close()", &data_channel);
                }
                closed
            }
            None => true,
        };
        if closed {
            data_channel.close();
        }
    })
}

/// Closes `data_channel` from the queue, or right away if the queue stopped
/// before getting to it.
fn close_data_channel(transport: &TransportInner, name: &str, data_channel: &Arc<dyn DataChannel>) {
    let queued_channel = Arc::clone(data_channel);
    let outcome = transport.queue.push(name, async move {
        queued_channel.close();
        Ok(())
    });

    let data_channel = Arc::clone(data_channel);
    transport.runtime.spawn(async move {
        if let Err(err) = outcome.await {
            debug!("data channel {} closed outside the queue: {err}", data_channel.id());
            data_channel.close();
        }
    });
}
