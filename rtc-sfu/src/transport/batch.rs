//! Coalescing of consumer changes.
//!
//! Consumer creation, pause, resume and close requests made within the same
//! scheduling tick are collected into a pending batch and flushed through
//! the transport's queue as one handler call. All four flows share one flush
//! loop: the batch is taken at the start of the queued flush, so requests
//! arriving meanwhile start the next batch, and the loop keeps flushing until
//! a flush finds nothing new.

use std::sync::{Arc, Weak};

use log::{debug, error, trace};
use shared::error::Error;

use crate::constants::PROBATOR_TRACK_ID;
use crate::consumer::{Consumer, ConsumerInit, ConsumerOptions};
use crate::handler::HandlerReceiveOptions;
use crate::rtp_parameters::{RTCRtpParameters, RtpCodecKind};
use crate::serial_queue::BoxFuture;
use crate::transport::endpoint;
use crate::transport::request::Responder;
use crate::transport::{RTCTransportEvent, TransportInner};

#[derive(Default)]
pub(crate) struct PendingBatch<C> {
    pub(crate) items: C,
    pub(crate) in_progress: bool,
}

pub(crate) trait BatchItems: Default + Send + 'static {
    fn is_empty(&self) -> bool;
}

/// Consumers in insertion order, each at most once.
#[derive(Default)]
pub(crate) struct ConsumerSet(Vec<Consumer>);

impl ConsumerSet {
    pub(crate) fn insert(&mut self, consumer: Consumer) {
        if !self.contains(consumer.id()) {
            self.0.push(consumer);
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let len = self.0.len();
        self.0.retain(|consumer| consumer.id() != id);
        self.0.len() != len
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|consumer| consumer.id() == id)
    }

    fn local_ids(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|consumer| consumer.local_id().to_owned())
            .collect()
    }
}

impl BatchItems for ConsumerSet {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A `consume()` call waiting for its batch.
pub(crate) struct ConsumerCreationTask {
    pub(crate) options: ConsumerOptions,
    pub(crate) responder: Responder<Consumer>,
}

impl BatchItems for Vec<ConsumerCreationTask> {
    fn is_empty(&self) -> bool {
        <[ConsumerCreationTask]>::is_empty(self)
    }
}

#[derive(Default)]
pub(crate) struct ConsumerBatches {
    pub(crate) create: PendingBatch<Vec<ConsumerCreationTask>>,
    pub(crate) pause: PendingBatch<ConsumerSet>,
    pub(crate) resume: PendingBatch<ConsumerSet>,
    pub(crate) close: PendingBatch<ConsumerSet>,
}

/// One coalescing flow: where its batch lives and how a batch is flushed.
pub(crate) trait BatchFlow: 'static {
    type Items: BatchItems;

    /// Queue task name.
    const NAME: &'static str;

    fn batch(batches: &mut ConsumerBatches) -> &mut PendingBatch<Self::Items>;

    fn flush(transport: Arc<TransportInner>, items: Self::Items) -> BoxFuture<()>;
}

pub(crate) struct CreateConsumers;
pub(crate) struct PauseConsumers;
pub(crate) struct ResumeConsumers;
pub(crate) struct CloseConsumers;

impl BatchFlow for CreateConsumers {
    type Items = Vec<ConsumerCreationTask>;
    const NAME: &'static str = "create_pending_consumers()";

    fn batch(batches: &mut ConsumerBatches) -> &mut PendingBatch<Self::Items> {
        &mut batches.create
    }

    fn flush(transport: Arc<TransportInner>, tasks: Self::Items) -> BoxFuture<()> {
        Box::pin(create_pending_consumers(transport, tasks))
    }
}

impl BatchFlow for PauseConsumers {
    type Items = ConsumerSet;
    const NAME: &'static str = "pause_pending_consumers()";

    fn batch(batches: &mut ConsumerBatches) -> &mut PendingBatch<Self::Items> {
        &mut batches.pause
    }

    fn flush(transport: Arc<TransportInner>, consumers: Self::Items) -> BoxFuture<()> {
        Box::pin(async move {
            if let Err(err) = transport.handler.pause_receiving(consumers.local_ids()).await {
                error!("pause_pending_consumers() | failed: {err}");
            }
        })
    }
}

impl BatchFlow for ResumeConsumers {
    type Items = ConsumerSet;
    const NAME: &'static str = "resume_pending_consumers()";

    fn batch(batches: &mut ConsumerBatches) -> &mut PendingBatch<Self::Items> {
        &mut batches.resume
    }

    fn flush(transport: Arc<TransportInner>, consumers: Self::Items) -> BoxFuture<()> {
        Box::pin(async move {
            if let Err(err) = transport.handler.resume_receiving(consumers.local_ids()).await {
                error!("resume_pending_consumers() | failed: {err}");
            }
        })
    }
}

impl BatchFlow for CloseConsumers {
    type Items = ConsumerSet;
    const NAME: &'static str = "close_pending_consumers()";

    fn batch(batches: &mut ConsumerBatches) -> &mut PendingBatch<Self::Items> {
        &mut batches.close
    }

    fn flush(transport: Arc<TransportInner>, consumers: Self::Items) -> BoxFuture<()> {
        Box::pin(async move {
            if let Err(err) = transport.handler.stop_receiving(consumers.local_ids()).await {
                error!("close_pending_consumers() | failed: {err}");
            }
        })
    }
}

/// Schedules a flush of `F` on the next scheduler turn unless one is
/// already in flight.
pub(crate) fn schedule_flush<F: BatchFlow>(transport: &Arc<TransportInner>) {
    {
        let mut state = transport.state.lock();
        if state.closed {
            return;
        }
        let batch = F::batch(&mut state.batches);
        if batch.in_progress {
            return;
        }
        batch.in_progress = true;
    }

    let transport_weak = Arc::downgrade(transport);
    transport.runtime.spawn(async move {
        // lets the rest of the current tick join the batch
        tokio::task::yield_now().await;
        run_flush_loop::<F>(transport_weak).await;
    });
}

async fn run_flush_loop<F: BatchFlow>(transport: Weak<TransportInner>) {
    loop {
        let outcome = {
            let Some(inner) = transport.upgrade() else {
                return;
            };
            let task_inner = Arc::clone(&inner);
            inner.queue.push(F::NAME, async move {
                let items = {
                    let mut state = task_inner.state.lock();
                    std::mem::take(&mut F::batch(&mut state.batches).items)
                };
                if !items.is_empty() {
                    F::flush(task_inner, items).await;
                }
                Ok(())
            })
        };

        let settled = outcome.await;

        let Some(inner) = transport.upgrade() else {
            return;
        };
        let mut state = inner.state.lock();
        let closed = state.closed;
        let batch = F::batch(&mut state.batches);
        if settled.is_err() || closed || batch.items.is_empty() {
            batch.in_progress = false;
            return;
        }

        trace!("{} | more requests arrived, flushing again", F::NAME);
    }
}

async fn create_pending_consumers(
    transport: Arc<TransportInner>,
    tasks: Vec<ConsumerCreationTask>,
) {
    debug!("create_pending_consumers() | {} consumers", tasks.len());

    let options_list = tasks
        .iter()
        .map(|task| HandlerReceiveOptions {
            track_id: task.options.id.clone(),
            kind: task.options.kind,
            rtp_parameters: task.options.rtp_parameters.clone(),
            stream_id: task.options.stream_id.clone(),
        })
        .collect::<Vec<_>>();

    let results = match transport.handler.receive(options_list).await {
        Ok(results) if results.len() == tasks.len() => results,
        Ok(results) => {
            let err = Error::ErrHandler(format!(
                "receive() returned {} results for {} requests",
                results.len(),
                tasks.len()
            ));
            reject_all(tasks, &err);
            return;
        }
        Err(err) => {
            reject_all(tasks, &err);
            return;
        }
    };

    let mut probator_source: Option<RTCRtpParameters> = None;

    for (task, result) in tasks.into_iter().zip(results) {
        let ConsumerCreationTask { options, responder } = task;
        let kind = options.kind;

        let listener =
            endpoint::consumer_listener(&transport, options.id.clone(), result.local_id.clone());
        let consumer = Consumer::new(
            ConsumerInit {
                id: options.id,
                local_id: result.local_id,
                producer_id: options.producer_id,
                rtp_receiver: result.rtp_receiver,
                track: result.track,
                rtp_parameters: options.rtp_parameters,
                app_data: options.app_data,
            },
            listener,
        );

        if let Err(err) = transport.register_consumer(&consumer) {
            responder.reject(err);
            continue;
        }

        if kind == RtpCodecKind::Video
            && probator_source.is_none()
            && !transport.state.lock().probator_consumer_created
        {
            probator_source = Some(consumer.rtp_parameters().clone());
        }

        transport.emit(RTCTransportEvent::OnNewConsumer(consumer.clone()));
        responder.accept(consumer);
    }

    if let Some(rtp_parameters) = probator_source {
        create_probator_consumer(&transport, &rtp_parameters).await;
    }
}

fn reject_all(tasks: Vec<ConsumerCreationTask>, err: &Error) {
    error!("create_pending_consumers() | receive() failed: {err}");
    for task in tasks {
        task.responder.reject(err.clone());
    }
}

/// Receives the probation stream used for bandwidth estimation. Failures
/// are logged; the next video consumer batch tries again.
async fn create_probator_consumer(transport: &TransportInner, video_params: &RTCRtpParameters) {
    let rtp_parameters = match transport.ortc.generate_probator_rtp_parameters(video_params) {
        Ok(rtp_parameters) => rtp_parameters,
        Err(err) => {
            error!("create_probator_consumer() | invalid parameters: {err}");
            return;
        }
    };

    let options = HandlerReceiveOptions {
        track_id: PROBATOR_TRACK_ID.to_owned(),
        kind: RtpCodecKind::Video,
        rtp_parameters,
        stream_id: None,
    };

    match transport.handler.receive(vec![options]).await {
        Ok(_) => {
            debug!("create_probator_consumer() | probator consumer created");
            transport.state.lock().probator_consumer_created = true;
        }
        Err(err) => error!("create_probator_consumer() | failed: {err}"),
    }
}
