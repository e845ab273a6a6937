//! Typed messages for actor communication

use std::fmt;

use chrono::{DateTime, Utc};
use ractor::{ActorRef, Message, RpcReplyPort};
use serde::Serialize;

use crate::{
    adapter::metrics::MetricsSnapshot,
    domain::{
        phase::Signal,
        work::{Payload, QueuedWork, WorkerId}
    },
    port::endpoint::WorkerHandle
};

/// Messages for the Dispatcher actor
pub enum DispatcherMessage<P> {
    /// Enqueue new work, or drop it if the queue is full
    Submit(QueuedWork<P>),
    /// A worker announces itself
    Register { worker: WorkerHandle<P> },
    /// A worker asks for its next item
    RequestWork { worker: WorkerId },
    /// A worker finished its current item
    WorkDone { worker: WorkerId },
    /// A worker is gone for good; used by hosts with their own liveness detection
    WorkerTerminated { worker: WorkerId },
    /// Periodic feeder check
    Tick,
    /// Read-only view of the queue and registry
    Snapshot { reply: RpcReplyPort<DispatcherSnapshot<P>> }
}

/// Messages for Worker actors
#[derive(Debug)]
pub enum WorkerMessage<P, O> {
    /// An assignment from the dispatcher
    WorkToBeDone(QueuedWork<P>),
    /// The dispatcher has queued work
    WorkIsReady,
    /// Internal: the handler finished the current item
    WorkComplete,
    /// Anything else, routed to the handler
    Other(O)
}

/// Messages for work feeders
pub enum FeederMessage<P> {
    /// Submit up to `count` new items to `reply_to`
    FeedMoreWork { count: usize, reply_to: ActorRef<DispatcherMessage<P>> }
}

/// Messages for the Supervisor actor (root of the demo system)
#[derive(Debug)]
pub enum SupervisorMessage {
    /// Spawn feeder, dispatcher and workers
    Initialize,
    /// Submit a payload with no originator
    Submit { payload: String },
    /// System health check
    HealthCheck { reply: RpcReplyPort<SystemHealth> },
    /// Stop every child
    Shutdown
}

/// Queue and registry contents at one point in time
#[derive(Debug, Clone)]
pub struct DispatcherSnapshot<P> {
    pub queued:          Vec<QueuedWork<P>>,
    pub capacity:        usize,
    pub workers:         usize,
    pub busy_workers:    usize,
    pub last_feeder_ask: Option<DateTime<Utc>>
}

/// System health information
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub queue_depth:    usize,
    pub workers:        usize,
    pub busy_workers:   usize,
    pub metrics:        MetricsSnapshot,
    pub uptime_seconds: u64
}

impl<P, O> WorkerMessage<P, O> {
    pub fn signal(&self) -> Signal {
        match self {
            WorkerMessage::WorkToBeDone(_) => Signal::WorkToBeDone,
            WorkerMessage::WorkIsReady => Signal::WorkIsReady,
            WorkerMessage::WorkComplete => Signal::WorkComplete,
            WorkerMessage::Other(_) => Signal::Other
        }
    }
}

impl<P: Payload> fmt::Debug for DispatcherMessage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatcherMessage::Submit(work) => f.debug_tuple("Submit").field(work).finish(),
            DispatcherMessage::Register { worker } => f.debug_struct("Register").field("worker", &worker.id()).finish(),
            DispatcherMessage::RequestWork { worker } => f.debug_struct("RequestWork").field("worker", worker).finish(),
            DispatcherMessage::WorkDone { worker } => f.debug_struct("WorkDone").field("worker", worker).finish(),
            DispatcherMessage::WorkerTerminated { worker } => {
                f.debug_struct("WorkerTerminated").field("worker", worker).finish()
            }
            DispatcherMessage::Tick => f.write_str("Tick"),
            DispatcherMessage::Snapshot { .. } => f.write_str("Snapshot")
        }
    }
}

impl<P: Payload> fmt::Debug for FeederMessage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeederMessage::FeedMoreWork { count, reply_to } => f
                .debug_struct("FeedMoreWork")
                .field("count", count)
                .field("reply_to", &reply_to.get_id())
                .finish()
        }
    }
}

// Implement Message trait for Ractor
impl<P: Payload> Message for DispatcherMessage<P> {}
impl<P: Payload, O: fmt::Debug + Send + 'static> Message for WorkerMessage<P, O> {}
impl<P: Payload> Message for FeederMessage<P> {}
impl Message for SupervisorMessage {}
