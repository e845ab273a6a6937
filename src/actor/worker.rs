//! Worker Actor - Executes one item at a time
//!
//! Registers with its dispatcher before handling anything, then alternates between
//! idle and busy:
//! - Idle: asks for work when told it is ready, starts work when assigned
//! - Busy: reports completion and immediately asks for more, refuses new assignments
//!
//! What the work actually is belongs to the plugged-in [`WorkHandler`].

use std::{fmt::Debug, marker::PhantomData, sync::Arc};

use ractor::{Actor, ActorCell, ActorProcessingErr, ActorRef, concurrency::JoinHandle};
use tracing::{Level, event};

use crate::{
    actor::message::{DispatcherMessage, WorkerMessage},
    adapter::metrics::NoopMetrics,
    domain::{
        constant::worker,
        error::DispatchError,
        phase::{Action, Transition, WorkerPhase},
        work::{Payload, QueuedWork, WorkerId}
    },
    port::{
        endpoint::WorkerEndpoint,
        handler::{Completion, WorkHandler},
        metrics::Metrics
    }
};

/// Message type of a worker running handler `H`
pub type WorkerMsg<H> = WorkerMessage<<H as WorkHandler>::Payload, <H as WorkHandler>::Other>;

/// Startup arguments for a Worker
pub struct WorkerArguments<H: WorkHandler> {
    pub dispatcher: ActorRef<DispatcherMessage<H::Payload>>,
    pub handler:    H,
    pub metrics:    Arc<dyn Metrics>
}

impl<H: WorkHandler> WorkerArguments<H> {
    pub fn new(dispatcher: ActorRef<DispatcherMessage<H::Payload>>, handler: H) -> Self {
        Self { dispatcher, handler, metrics: Arc::new(NoopMetrics) }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Worker Actor State
pub struct WorkerState<H: WorkHandler> {
    dispatcher: ActorRef<DispatcherMessage<H::Payload>>,
    handler:    H,
    metrics:    Arc<dyn Metrics>,
    phase:      WorkerPhase
}

/// Worker Actor - runs handler `H` under the idle/busy protocol
pub struct Worker<H> {
    _handler: PhantomData<fn() -> H>
}

impl<H: WorkHandler> Default for Worker<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<H: WorkHandler> Actor for Worker<H> {
    type Arguments = WorkerArguments<H>;
    type Msg = WorkerMsg<H>;
    type State = WorkerState<H>;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        WorkerArguments { dispatcher, handler, metrics }: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        // Registration has to reach the dispatcher before anything can be offered to us
        dispatcher
            .cast(DispatcherMessage::Register { worker: Arc::new(myself.clone()) })
            .map_err(DispatchError::from)?;

        event!(Level::DEBUG, event = worker::WORKER_STARTED, worker = %myself.get_id());

        Ok(WorkerState { dispatcher, handler, metrics, phase: WorkerPhase::Idle })
    }

    async fn post_stop(&self, myself: ActorRef<Self::Msg>, state: &mut Self::State) -> Result<(), ActorProcessingErr> {
        event!(Level::DEBUG, event = worker::WORKER_STOPPED, worker = %myself.get_id(), phase = ?state.phase);
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        let Transition { action, next } = state.phase.on(message.signal());
        state.phase = next;

        match (action, message) {
            (Action::Execute, WorkerMessage::WorkToBeDone(work)) => self.execute(&myself, work, state).await?,
            (Action::RequestWork, _) => self.request_work(&myself, state),
            (Action::ReportDone, _) => {
                state.metrics.work_completed();
                event!(Level::DEBUG, event = worker::WORK_COMPLETED, worker = %myself.get_id());
                self.tell_dispatcher(DispatcherMessage::WorkDone { worker: myself.get_id() }, state);
                self.request_work(&myself, state);
            }
            (Action::Delegate, WorkerMessage::Other(other)) => state.handler.handle_any(other).await?,
            (Action::Violation(anomaly), message) => {
                event!(Level::ERROR, event = worker::PROTOCOL_VIOLATION,
                       worker = %myself.get_id(), anomaly = %anomaly, message = ?message);
            }
            (action, message) => {
                event!(Level::DEBUG, event = worker::NOTICE_IGNORED,
                       worker = %myself.get_id(), action = ?action, message = ?message);
            }
        }

        Ok(())
    }
}

impl<H: WorkHandler> Worker<H> {
    pub fn new() -> Self {
        Self { _handler: PhantomData }
    }

    /// Spawn a worker; it registers with its dispatcher during startup
    pub async fn start(
        name: Option<String>,
        arguments: WorkerArguments<H>
    ) -> Result<(ActorRef<WorkerMsg<H>>, JoinHandle<()>), DispatchError> {
        Ok(Actor::spawn(name, Self::new(), arguments).await?)
    }

    async fn execute(
        &self,
        myself: &ActorRef<WorkerMsg<H>>,
        work: QueuedWork<H::Payload>,
        state: &mut WorkerState<H>
    ) -> Result<(), DispatchError> {
        event!(Level::DEBUG, event = worker::WORK_RECEIVED, worker = %myself.get_id(), work = ?work.payload);

        let me = myself.clone();
        let completion = Completion::new(move || me.cast(WorkerMessage::WorkComplete).map_err(DispatchError::from));

        state.handler.handle_work(work.payload, work.originator, completion).await
    }

    fn request_work(&self, myself: &ActorRef<WorkerMsg<H>>, state: &WorkerState<H>) {
        event!(Level::DEBUG, event = worker::WORK_REQUESTED, worker = %myself.get_id());
        self.tell_dispatcher(DispatcherMessage::RequestWork { worker: myself.get_id() }, state);
    }

    fn tell_dispatcher(&self, message: DispatcherMessage<H::Payload>, state: &WorkerState<H>) {
        if let Err(e) = state.dispatcher.cast(message) {
            event!(Level::ERROR, event = worker::DISPATCHER_UNREACHABLE, error = %e);
        }
    }
}

impl<P, O> WorkerEndpoint<P> for ActorRef<WorkerMessage<P, O>>
where
    P: Payload,
    O: Debug + Send + 'static
{
    fn id(&self) -> WorkerId {
        self.get_id()
    }

    fn cell(&self) -> ActorCell {
        self.get_cell()
    }

    fn offer_work(&self, work: QueuedWork<P>) -> Result<(), DispatchError> {
        Ok(self.cast(WorkerMessage::WorkToBeDone(work))?)
    }

    fn notify_ready(&self) -> Result<(), DispatchError> {
        Ok(self.cast(WorkerMessage::WorkIsReady)?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ractor::rpc::{CallResult, call};
    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

    use super::*;
    use crate::{
        actor::{
            dispatcher::{Dispatcher, DispatcherArguments},
            message::DispatcherSnapshot
        },
        adapter::metrics::InMemoryMetrics,
        config::DispatcherConfig,
        domain::work::Originator
    };

    /// Records every item and holds its completion until told to finish
    struct Manual {
        seen:    UnboundedSender<String>,
        pending: Option<Completion>
    }

    #[derive(Debug)]
    enum Control {
        Finish,
        Fail
    }

    #[async_trait::async_trait]
    impl WorkHandler for Manual {
        type Payload = String;
        type Other = Control;

        async fn handle_work(
            &mut self,
            work: String,
            _originator: Originator,
            completion: Completion
        ) -> Result<(), DispatchError> {
            let _ = self.seen.send(work);
            self.pending = Some(completion);
            Ok(())
        }

        async fn handle_any(&mut self, message: Control) -> Result<(), DispatchError> {
            match message {
                Control::Finish => match self.pending.take() {
                    Some(completion) => completion.complete(),
                    None => Ok(())
                },
                Control::Fail => Err(DispatchError::Handler("told to fail".to_string()))
            }
        }
    }

    /// Finishes each item from a spawned task once the gate opens
    struct Deferred {
        seen: UnboundedSender<String>,
        gate: Arc<tokio::sync::Notify>
    }

    #[async_trait::async_trait]
    impl WorkHandler for Deferred {
        type Payload = String;
        type Other = ();

        async fn handle_work(
            &mut self,
            work: String,
            _originator: Originator,
            completion: Completion
        ) -> Result<(), DispatchError> {
            let _ = self.seen.send(work);
            let gate = self.gate.clone();
            tokio::spawn(async move {
                gate.notified().await;
                let _ = completion.complete();
            });
            Ok(())
        }
    }

    struct Fixture {
        dispatcher: ActorRef<DispatcherMessage<String>>,
        worker:     ActorRef<WorkerMsg<Manual>>,
        handle:     JoinHandle<()>,
        seen:       UnboundedReceiver<String>,
        metrics:    Arc<InMemoryMetrics>
    }

    async fn fixture() -> Fixture {
        let metrics = InMemoryMetrics::new();
        let config = DispatcherConfig { tick_interval_ms: 60_000, ..DispatcherConfig::default() };
        let arguments = DispatcherArguments::new(config).with_metrics(metrics.clone());
        let (dispatcher, _) = Dispatcher::<String>::start(None, arguments).await.unwrap();

        let (sender, seen) = unbounded_channel();
        let handler = Manual { seen: sender, pending: None };
        let arguments = WorkerArguments::new(dispatcher.clone(), handler).with_metrics(metrics.clone());
        let (worker, handle) = Worker::start(None, arguments).await.unwrap();

        Fixture { dispatcher, worker, handle, seen, metrics }
    }

    async fn snapshot(dispatcher: &ActorRef<DispatcherMessage<String>>) -> DispatcherSnapshot<String> {
        match call(dispatcher, |reply| DispatcherMessage::Snapshot { reply }, Some(Duration::from_secs(5))).await {
            Ok(CallResult::Success(snapshot)) => snapshot,
            _ => panic!("Snapshot call failed")
        }
    }

    async fn eventually<F>(dispatcher: &ActorRef<DispatcherMessage<String>>, condition: F) -> DispatcherSnapshot<String>
    where
        F: Fn(&DispatcherSnapshot<String>) -> bool
    {
        for _ in 0..200 {
            let view = snapshot(dispatcher).await;
            if condition(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Condition not reached in time")
    }

    async fn next_seen(seen: &mut UnboundedReceiver<String>) -> String {
        tokio::time::timeout(Duration::from_secs(2), seen.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_worker_registers_on_start() {
        let fixture = fixture().await;

        let view = snapshot(&fixture.dispatcher).await;
        assert_eq!(view.workers, 1);
        assert_eq!(view.busy_workers, 0);

        fixture.dispatcher.stop(None);
    }

    #[tokio::test]
    async fn test_completion_reports_done_and_asks_again() {
        let mut fixture = fixture().await;

        fixture.dispatcher.cast(DispatcherMessage::Submit(QueuedWork::anonymous("a".to_string()))).unwrap();
        fixture.dispatcher.cast(DispatcherMessage::Submit(QueuedWork::anonymous("b".to_string()))).unwrap();

        assert_eq!(next_seen(&mut fixture.seen).await, "a");
        fixture.worker.cast(WorkerMessage::Other(Control::Finish)).unwrap();

        // Eager re-request picks up the second item without another notice
        assert_eq!(next_seen(&mut fixture.seen).await, "b");
        fixture.worker.cast(WorkerMessage::Other(Control::Finish)).unwrap();

        eventually(&fixture.dispatcher, |view| view.busy_workers == 0 && view.queued.is_empty()).await;
        let metrics = fixture.metrics.snapshot();
        assert_eq!(metrics.work_completed, 2);
        assert_eq!(metrics.work_accepted, 2);

        fixture.dispatcher.stop(None);
    }

    #[tokio::test]
    async fn test_busy_worker_refuses_second_assignment() {
        let mut fixture = fixture().await;

        fixture.dispatcher.cast(DispatcherMessage::Submit(QueuedWork::anonymous("a".to_string()))).unwrap();
        assert_eq!(next_seen(&mut fixture.seen).await, "a");

        fixture.worker.cast(WorkerMessage::WorkToBeDone(QueuedWork::anonymous("rogue".to_string()))).unwrap();
        fixture.worker.cast(WorkerMessage::WorkIsReady).unwrap();
        fixture.worker.cast(WorkerMessage::Other(Control::Finish)).unwrap();

        eventually(&fixture.dispatcher, |view| view.busy_workers == 0).await;
        assert!(tokio::time::timeout(Duration::from_millis(100), fixture.seen.recv()).await.is_err());
        assert_eq!(fixture.metrics.snapshot().work_completed, 1);

        fixture.dispatcher.stop(None);
    }

    #[tokio::test]
    async fn test_stray_completion_while_idle_is_ignored() {
        let fixture = fixture().await;

        fixture.worker.cast(WorkerMessage::WorkComplete).unwrap();

        let view = snapshot(&fixture.dispatcher).await;
        assert_eq!(view.workers, 1);
        assert_eq!(fixture.metrics.snapshot().work_completed, 0);

        fixture.dispatcher.stop(None);
    }

    #[tokio::test]
    async fn test_failing_handler_returns_work_to_queue() {
        let mut fixture = fixture().await;

        fixture.dispatcher.cast(DispatcherMessage::Submit(QueuedWork::anonymous("a".to_string()))).unwrap();
        assert_eq!(next_seen(&mut fixture.seen).await, "a");

        fixture.worker.cast(WorkerMessage::Other(Control::Fail)).unwrap();
        let _ = fixture.handle.await;

        let view = eventually(&fixture.dispatcher, |view| view.workers == 0).await;
        assert_eq!(view.queued, vec![QueuedWork::anonymous("a".to_string())]);

        fixture.dispatcher.stop(None);
    }

    #[tokio::test]
    async fn test_completion_from_spawned_task_keeps_worker_busy_until_signalled() {
        let metrics = InMemoryMetrics::new();
        let config = DispatcherConfig { tick_interval_ms: 60_000, ..DispatcherConfig::default() };
        let arguments = DispatcherArguments::new(config).with_metrics(metrics.clone());
        let (dispatcher, _) = Dispatcher::<String>::start(None, arguments).await.unwrap();

        let (sender, mut seen) = unbounded_channel();
        let gate = Arc::new(tokio::sync::Notify::new());
        let handler = Deferred { seen: sender, gate: gate.clone() };
        let arguments = WorkerArguments::new(dispatcher.clone(), handler).with_metrics(metrics.clone());
        let (worker, _) = Worker::start(None, arguments).await.unwrap();

        dispatcher.cast(DispatcherMessage::Submit(QueuedWork::anonymous("a".to_string()))).unwrap();
        dispatcher.cast(DispatcherMessage::Submit(QueuedWork::anonymous("b".to_string()))).unwrap();
        assert_eq!(next_seen(&mut seen).await, "a");

        // The mailbox stays free while the task runs, yet nothing new is taken on
        worker.cast(WorkerMessage::WorkIsReady).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let view = snapshot(&dispatcher).await;
        assert_eq!(view.busy_workers, 1);
        assert_eq!(view.queued.len(), 1);
        assert_eq!(metrics.snapshot().work_completed, 0);
        assert!(seen.try_recv().is_err());

        gate.notify_one();
        assert_eq!(next_seen(&mut seen).await, "b");
        eventually(&dispatcher, |view| view.queued.is_empty()).await;
        assert_eq!(metrics.snapshot().work_completed, 1);

        gate.notify_one();
        eventually(&dispatcher, |view| view.busy_workers == 0).await;
        assert_eq!(metrics.snapshot().work_completed, 2);

        dispatcher.stop(None);
    }
}
