//! Dispatcher Actor - Owns the work queue and the worker registry
//!
//! The Dispatcher hands out queued work one item per request:
//! - Accepts submissions into a bounded FIFO queue, dropping them when it is full
//! - Registers workers and watches them for termination
//! - Tells idle workers when work is queued; they have to ask for it
//! - Assigns the queue head to a worker that asks while idle
//! - Puts a dead worker's in-flight item back at the tail of the queue
//! - Prods the feeder when it has not been asked for a while

use std::{marker::PhantomData, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, ActorStatus, RpcReplyPort, SupervisionEvent, concurrency::JoinHandle};
use tracing::{Level, event};

use crate::{
    actor::message::{DispatcherMessage, DispatcherSnapshot, FeederMessage},
    adapter::metrics::NoopMetrics,
    config::DispatcherConfig,
    domain::{
        book::{DispatchBook, Termination, WorkRequest},
        constant::dispatcher,
        error::DispatchError,
        work::{Payload, QueuedWork, WorkerId}
    },
    port::{endpoint::WorkerHandle, metrics::Metrics}
};

/// Startup arguments for the Dispatcher
pub struct DispatcherArguments<P> {
    pub config:  DispatcherConfig,
    /// Where to ask for more work when the queue runs dry
    pub feeder:  Option<ActorRef<FeederMessage<P>>>,
    pub metrics: Arc<dyn Metrics>
}

impl<P: Payload> DispatcherArguments<P> {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config, feeder: None, metrics: Arc::new(NoopMetrics) }
    }

    pub fn with_feeder(mut self, feeder: ActorRef<FeederMessage<P>>) -> Self {
        self.feeder = Some(feeder);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Dispatcher Actor State
pub struct DispatcherState<P: Payload> {
    /// Queue and registry
    book:               DispatchBook<P, WorkerHandle<P>>,
    config:             DispatcherConfig,
    feeder:             Option<ActorRef<FeederMessage<P>>>,
    metrics:            Arc<dyn Metrics>,
    /// Monotonic time of the last feeder ask, for the tick
    last_feeder_ask:    Option<Instant>,
    /// Wall-clock time of the last feeder ask, for snapshots
    last_feeder_ask_at: Option<DateTime<Utc>>,
    tick:               Option<JoinHandle<()>>
}

/// Dispatcher Actor - hands queued work to idle workers
pub struct Dispatcher<P> {
    _payload: PhantomData<fn() -> P>
}

impl<P: Payload> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<P: Payload> Actor for Dispatcher<P> {
    type Arguments = DispatcherArguments<P>;
    type Msg = DispatcherMessage<P>;
    type State = DispatcherState<P>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        DispatcherArguments { config, feeder, metrics }: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        config.validate()?;

        event!(Level::DEBUG, event = dispatcher::DISPATCHER_STARTED,
               capacity = config.queue_capacity, has_feeder = feeder.is_some());

        metrics.observe_queue_depth(0);

        Ok(DispatcherState {
            book: DispatchBook::new(config.queue_capacity),
            config,
            feeder,
            metrics,
            last_feeder_ask: None,
            last_feeder_ask_at: None,
            tick: None
        })
    }

    async fn post_start(&self, myself: ActorRef<Self::Msg>, state: &mut Self::State) -> Result<(), ActorProcessingErr> {
        state.tick = Some(myself.send_interval(state.config.tick_interval(), || DispatcherMessage::Tick));
        Ok(())
    }

    async fn post_stop(&self, _myself: ActorRef<Self::Msg>, state: &mut Self::State) -> Result<(), ActorProcessingErr> {
        if let Some(tick) = state.tick.take() {
            tick.abort();
        }

        event!(Level::DEBUG, event = dispatcher::DISPATCHER_STOPPED,
               queued = state.book.len(), workers = state.book.worker_count());
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DispatcherMessage::Submit(work) => self.accept(work, state),
            DispatcherMessage::Register { worker } => self.register(&myself, worker, state),
            DispatcherMessage::RequestWork { worker } => self.request_work(&myself, worker, state),
            DispatcherMessage::WorkDone { worker } => self.work_done(worker, state),
            DispatcherMessage::WorkerTerminated { worker } => self.worker_terminated(worker, state),
            DispatcherMessage::Tick => self.tick(&myself, state),
            DispatcherMessage::Snapshot { reply } => self.snapshot(reply, state)
        }
        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                event!(Level::DEBUG, event = dispatcher::WORKER_TERMINATED, worker = %cell.get_id(), reason = ?reason);
                self.worker_terminated(cell.get_id(), state);
            }
            SupervisionEvent::ActorFailed(cell, error) => {
                event!(Level::WARN, event = dispatcher::WORKER_TERMINATED, worker = %cell.get_id(), error = %error);
                self.worker_terminated(cell.get_id(), state);
            }
            _ => {}
        }
        Ok(())
    }
}

impl<P: Payload> Dispatcher<P> {
    pub fn new() -> Self {
        Self { _payload: PhantomData }
    }

    /// Spawn a dispatcher; its tick starts right away
    pub async fn start(
        name: Option<String>,
        arguments: DispatcherArguments<P>
    ) -> Result<(ActorRef<DispatcherMessage<P>>, JoinHandle<()>), DispatchError> {
        Ok(Actor::spawn(name, Self::new(), arguments).await?)
    }

    /// The submission path, also taken by re-queued work
    fn accept(&self, work: QueuedWork<P>, state: &mut DispatcherState<P>) {
        match state.book.offer(work) {
            Ok(depth) => {
                state.metrics.work_accepted();
                state.metrics.observe_queue_depth(depth);
                event!(Level::DEBUG, event = dispatcher::WORK_ACCEPTED, depth = depth);
                self.notify_idle_workers(state);
            }
            Err(rejected) => {
                state.metrics.work_rejected();
                event!(Level::WARN, event = dispatcher::WORK_REJECTED,
                       capacity = state.book.capacity(), payload = ?rejected.payload);
            }
        }
    }

    fn register(&self, myself: &ActorRef<DispatcherMessage<P>>, worker: WorkerHandle<P>, state: &mut DispatcherState<P>) {
        let id = worker.id();

        if !state.book.register(id, worker.clone()) {
            event!(Level::WARN, event = dispatcher::WORKER_REGISTERED, worker = %id, message = "already_registered");
            return;
        }

        myself.monitor(worker.cell());

        // A worker that stopped before its registration arrived never produces a monitor event
        if matches!(worker.cell().get_status(), ActorStatus::Stopping | ActorStatus::Stopped) {
            event!(Level::WARN, event = dispatcher::WORKER_REGISTERED, worker = %id, message = "already_stopped");
            self.worker_terminated(id, state);
            return;
        }

        event!(Level::INFO, event = dispatcher::WORKER_REGISTERED,
               worker = %id, workers = state.book.worker_count());

        self.notify_idle_workers(state);
    }

    fn request_work(&self, myself: &ActorRef<DispatcherMessage<P>>, worker: WorkerId, state: &mut DispatcherState<P>) {
        match state.book.request(worker) {
            WorkRequest::UnknownWorker => {
                event!(Level::ERROR, event = dispatcher::UNKNOWN_WORKER, worker = %worker, operation = "request_work");
            }
            WorkRequest::QueueEmpty => {
                self.ask_for_more_work(myself, state);
                state.metrics.asked_for_work_while_idle();
            }
            WorkRequest::AlreadyAssigned => {
                event!(Level::WARN, event = dispatcher::WORK_REQUEST_IGNORED, worker = %worker,
                       message = "worker_already_assigned");
            }
            WorkRequest::Assigned { worker: handle, work } => {
                state.metrics.observe_queue_depth(state.book.len());
                event!(Level::DEBUG, event = dispatcher::WORK_ASSIGNED,
                       worker = %worker, originator = ?work.originator.id(), depth = state.book.len());

                // The record keeps the assignment, so the termination that follows a
                // closed mailbox puts the work back.
                if let Err(e) = handle.offer_work(work) {
                    event!(Level::ERROR, event = dispatcher::WORK_DELIVERY_FAILED, worker = %worker, error = %e);
                }
            }
        }
    }

    fn work_done(&self, worker: WorkerId, state: &mut DispatcherState<P>) {
        if state.book.complete(worker) {
            event!(Level::DEBUG, event = dispatcher::WORK_DONE, worker = %worker);
        } else {
            event!(Level::ERROR, event = dispatcher::UNKNOWN_WORKER, worker = %worker, operation = "work_done",
                   message = "reporting work is done but is not registered");
        }
    }

    fn worker_terminated(&self, worker: WorkerId, state: &mut DispatcherState<P>) {
        match state.book.terminate(worker) {
            Termination::InFlight(work) => {
                event!(Level::WARN, event = dispatcher::WORK_REQUEUED,
                       worker = %worker, originator = ?work.originator.id());
                self.accept(work, state);
            }
            Termination::Idle => {
                event!(Level::INFO, event = dispatcher::WORKER_TERMINATED,
                       worker = %worker, workers = state.book.worker_count());
            }
            Termination::UnknownWorker => {
                event!(Level::ERROR, event = dispatcher::UNKNOWN_WORKER, worker = %worker, operation = "terminated");
            }
        }
    }

    fn tick(&self, myself: &ActorRef<DispatcherMessage<P>>, state: &mut DispatcherState<P>) {
        if state.feeder.is_none() {
            return;
        }

        let idle_for_too_long = state.last_feeder_ask.is_none_or(|at| at.elapsed() > state.config.feeder_idle());
        if idle_for_too_long {
            event!(Level::INFO, event = dispatcher::FEEDER_PRODDED, message = "delta expired, asking for more work");
            state.metrics.prod_for_work();
            self.ask_for_more_work(myself, state);
        }
    }

    fn ask_for_more_work(&self, myself: &ActorRef<DispatcherMessage<P>>, state: &mut DispatcherState<P>) {
        state.last_feeder_ask = Some(Instant::now());
        state.last_feeder_ask_at = Some(Utc::now());

        let Some(feeder) = &state.feeder else {
            return;
        };

        let count = state.config.feed_batch_size;
        match feeder.cast(FeederMessage::FeedMoreWork { count, reply_to: myself.clone() }) {
            Ok(()) => event!(Level::DEBUG, event = dispatcher::FEEDER_ASKED, count = count),
            Err(e) => event!(Level::WARN, event = dispatcher::FEEDER_UNREACHABLE, error = %e)
        }
    }

    /// Prompt idle workers to ask for work; never assigns anything itself
    fn notify_idle_workers(&self, state: &DispatcherState<P>) {
        let idle = state.book.workers_to_notify();
        if idle.is_empty() {
            return;
        }

        for worker in &idle {
            if let Err(e) = worker.notify_ready() {
                event!(Level::WARN, event = dispatcher::WORKERS_NOTIFIED, worker = %worker.id(), error = %e);
            }
        }

        event!(Level::DEBUG, event = dispatcher::WORKERS_NOTIFIED, notified = idle.len());
    }

    fn snapshot(&self, reply: RpcReplyPort<DispatcherSnapshot<P>>, state: &DispatcherState<P>) {
        let snapshot = DispatcherSnapshot {
            queued:          state.book.queued().cloned().collect(),
            capacity:        state.book.capacity(),
            workers:         state.book.worker_count(),
            busy_workers:    state.book.busy_count(),
            last_feeder_ask: state.last_feeder_ask_at
        };

        if reply.send(snapshot).is_err() {
            event!(Level::WARN, event = dispatcher::SNAPSHOT_FAILED, message = "caller went away");
        }
    }
}
