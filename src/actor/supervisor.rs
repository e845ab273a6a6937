//! Supervisor Actor - Root of the demo system
//!
//! The Supervisor owns the demo topology and system-wide concerns:
//! - Spawns the feeder, the dispatcher and the worker pool as linked children
//! - Replaces workers that stop or fail outside of shutdown, keeping the pool size
//! - Forwards submissions to the dispatcher
//! - Provides health checks and shutdown

use std::{sync::Arc, time::SystemTime};

use ractor::{Actor, ActorCell, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr, SupervisionEvent, rpc::CallResult};
use tracing::{Level, event};

use crate::{
    actor::{
        dispatcher::{Dispatcher, DispatcherArguments},
        message::{DispatcherMessage, FeederMessage, SupervisorMessage, SystemHealth},
        worker::{Worker, WorkerArguments, WorkerMsg}
    },
    adapter::{feeder::UuidFeeder, hello::HelloHandler, metrics::InMemoryMetrics},
    config::Settings,
    domain::{constant::supervisor, error::DispatchError, work::QueuedWork}
};

/// Supervisor Actor State - tracks child actors and system metrics
pub struct SupervisorState {
    settings:       Settings,
    metrics:        Arc<InMemoryMetrics>,
    dispatcher:     Option<ActorRef<DispatcherMessage<String>>>,
    feeder:         Option<ActorRef<FeederMessage<String>>>,
    workers:        Vec<ActorRef<WorkerMsg<HelloHandler>>>,
    /// Workers spawned so far, used to name the next one
    spawned:        usize,
    /// System startup time for uptime calculation
    startup_time:   SystemTime,
    is_initialized: bool
}

/// Supervisor Actor - Root supervisor of the actor system
pub struct Supervisor;

#[async_trait::async_trait]
impl Actor for Supervisor {
    type Arguments = (Settings, Arc<InMemoryMetrics>);
    type Msg = SupervisorMessage;
    type State = SupervisorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        (settings, metrics): Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        settings.validate()?;

        event!(Level::DEBUG, event = supervisor::SUPERVISOR_STARTED, workers = settings.workers);

        Ok(SupervisorState {
            settings,
            metrics,
            dispatcher: None,
            feeder: None,
            workers: Vec::new(),
            spawned: 0,
            startup_time: SystemTime::now(),
            is_initialized: false
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisorMessage::Initialize => self.handle_initialize(myself, state).await,
            SupervisorMessage::Submit { payload } => self.handle_submit(payload, state),
            SupervisorMessage::HealthCheck { reply } => self.handle_health_check(reply, state).await,
            SupervisorMessage::Shutdown => self.handle_shutdown(state)
        }
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                event!(Level::DEBUG, event = supervisor::CHILD_TERMINATED, child = %cell.get_id(), reason = ?reason);
                self.replace_worker(&myself, &cell, state).await;
            }
            SupervisionEvent::ActorFailed(cell, error) => {
                event!(Level::WARN, event = supervisor::CHILD_TERMINATED, child = %cell.get_id(), error = %error);
                self.replace_worker(&myself, &cell, state).await;
            }
            _ => {}
        }
        Ok(())
    }
}

impl Supervisor {
    /// Spawn the complete actor system
    pub async fn spawn_system(
        settings: Settings,
        metrics: Arc<InMemoryMetrics>
    ) -> Result<ActorRef<SupervisorMessage>, DispatchError> {
        let (supervisor_ref, _handle) =
            Actor::spawn(Some("supervisor".to_string()), Supervisor, (settings, metrics)).await?;

        // Initialize the system
        if let Err(e) = supervisor_ref.cast(SupervisorMessage::Initialize) {
            event!(Level::ERROR, event = supervisor::SUPERVISOR_STARTED, error = %e);
        }

        Ok(supervisor_ref)
    }

    /// Spawn feeder, dispatcher and workers, in that order
    async fn handle_initialize(
        &self,
        myself: ActorRef<SupervisorMessage>,
        state: &mut SupervisorState
    ) -> Result<(), ActorProcessingErr> {
        if state.is_initialized {
            return Ok(());
        }

        event!(Level::DEBUG, event = supervisor::CHILDREN_SPAWNING);

        let (feeder, _) =
            Actor::spawn_linked(Some("feeder".to_string()), UuidFeeder, state.settings.feeder_budget, myself.get_cell())
                .await
                .inspect_err(|e| {
                    event!(Level::ERROR, event = supervisor::CHILDREN_SPAWN_FAILED, actor = "feeder", error = %e);
                })?;
        event!(Level::DEBUG, event = supervisor::CHILDREN_SPAWNED, actor = "feeder");

        let arguments = DispatcherArguments::new(state.settings.dispatcher.clone())
            .with_feeder(feeder.clone())
            .with_metrics(state.metrics.clone());
        let (dispatcher, _) =
            Actor::spawn_linked(Some("dispatcher".to_string()), Dispatcher::new(), arguments, myself.get_cell())
                .await
                .inspect_err(|e| {
                    event!(Level::ERROR, event = supervisor::CHILDREN_SPAWN_FAILED, actor = "dispatcher", error = %e);
                })?;
        event!(Level::DEBUG, event = supervisor::CHILDREN_SPAWNED, actor = "dispatcher");

        for _ in 0..state.settings.workers {
            let worker = self.spawn_worker(&myself, &dispatcher, state).await.inspect_err(|e| {
                event!(Level::ERROR, event = supervisor::CHILDREN_SPAWN_FAILED, actor = "worker", error = %e);
            })?;
            state.workers.push(worker);
        }
        event!(Level::DEBUG, event = supervisor::CHILDREN_SPAWNED, actor = "workers", count = state.workers.len());

        state.feeder = Some(feeder);
        state.dispatcher = Some(dispatcher);
        state.is_initialized = true;

        event!(Level::INFO, event = supervisor::SYSTEM_INITIALIZED, workers = state.workers.len());
        Ok(())
    }

    async fn spawn_worker(
        &self,
        myself: &ActorRef<SupervisorMessage>,
        dispatcher: &ActorRef<DispatcherMessage<String>>,
        state: &mut SupervisorState
    ) -> Result<ActorRef<WorkerMsg<HelloHandler>>, SpawnErr> {
        let name = format!("worker-{}", state.spawned);
        state.spawned += 1;

        let arguments = WorkerArguments::new(dispatcher.clone(), HelloHandler::new()).with_metrics(state.metrics.clone());
        let (worker, _) = Actor::spawn_linked(Some(name), Worker::new(), arguments, myself.get_cell()).await?;
        Ok(worker)
    }

    /// Swap a lost pool worker for a fresh one; other children are only logged
    async fn replace_worker(&self, myself: &ActorRef<SupervisorMessage>, cell: &ActorCell, state: &mut SupervisorState) {
        let before = state.workers.len();
        state.workers.retain(|worker| worker.get_id() != cell.get_id());
        if state.workers.len() == before || !state.is_initialized {
            return;
        }

        let Some(dispatcher) = state.dispatcher.clone() else {
            return;
        };

        match self.spawn_worker(myself, &dispatcher, state).await {
            Ok(worker) => {
                event!(Level::INFO, event = supervisor::WORKER_REPLACED, lost = %cell.get_id(), replacement = %worker.get_id());
                state.workers.push(worker);
            }
            Err(e) => {
                event!(Level::ERROR, event = supervisor::CHILDREN_SPAWN_FAILED, actor = "worker", error = %e);
            }
        }
    }

    fn handle_submit(&self, payload: String, state: &SupervisorState) -> Result<(), ActorProcessingErr> {
        match &state.dispatcher {
            Some(dispatcher) => {
                event!(Level::TRACE, event = supervisor::WORK_SUBMITTED, payload = %payload);
                if let Err(e) = dispatcher.cast(DispatcherMessage::Submit(QueuedWork::anonymous(payload))) {
                    event!(Level::ERROR, event = supervisor::WORK_SUBMITTED, error = %e);
                }
            }
            None => {
                event!(Level::WARN, event = supervisor::WORK_SUBMITTED, message = "system_not_initialized");
            }
        }
        Ok(())
    }

    /// Handle health check requests
    async fn handle_health_check(
        &self,
        reply: RpcReplyPort<SystemHealth>,
        state: &SupervisorState
    ) -> Result<(), ActorProcessingErr> {
        let uptime_seconds = state.startup_time.elapsed().unwrap_or_default().as_secs();

        let (queue_depth, workers, busy_workers) = match &state.dispatcher {
            Some(dispatcher) => {
                match ractor::rpc::call(dispatcher, |reply| DispatcherMessage::<String>::Snapshot { reply }, None).await {
                    Ok(CallResult::Success(snapshot)) => {
                        (snapshot.queued.len(), snapshot.workers, snapshot.busy_workers)
                    }
                    _ => (0, 0, 0)
                }
            }
            None => (0, 0, 0)
        };

        let health =
            SystemHealth { queue_depth, workers, busy_workers, metrics: state.metrics.snapshot(), uptime_seconds };

        event!(Level::DEBUG, event = supervisor::HEALTH_CHECK_COMPLETED,
               queue_depth = queue_depth, workers = workers, uptime_seconds = uptime_seconds);

        if reply.send(health).is_err() {
            event!(Level::ERROR, event = supervisor::HEALTH_CHECK_COMPLETED, message = "caller went away");
        }

        Ok(())
    }

    /// Shutdown child actors
    fn handle_shutdown(&self, state: &mut SupervisorState) -> Result<(), ActorProcessingErr> {
        event!(Level::DEBUG, event = supervisor::SYSTEM_SHUTDOWN_STARTED);

        if let Some(dispatcher) = state.dispatcher.take() {
            dispatcher.stop(None);
        }
        for worker in state.workers.drain(..) {
            worker.stop(None);
        }
        if let Some(feeder) = state.feeder.take() {
            feeder.stop(None);
        }

        state.is_initialized = false;
        event!(Level::INFO, event = supervisor::SYSTEM_SHUTDOWN_COMPLETED);
        Ok(())
    }
}
