use std::sync::Arc;

use ractor::ActorCell;

use crate::domain::{
    error::DispatchError,
    work::{Payload, QueuedWork, WorkerId}
};

/// How the dispatcher reaches a worker
///
/// Hides the worker's full message type, so workers running different handlers can
/// share one dispatcher as long as they agree on the payload.
pub trait WorkerEndpoint<P: Payload>: Send + Sync + 'static {
    fn id(&self) -> WorkerId;

    /// Underlying actor, used to watch for termination
    fn cell(&self) -> ActorCell;

    /// Deliver an assignment
    fn offer_work(&self, work: QueuedWork<P>) -> Result<(), DispatchError>;

    /// Tell an idle worker that the queue is non-empty
    fn notify_ready(&self) -> Result<(), DispatchError>;
}

pub type WorkerHandle<P> = Arc<dyn WorkerEndpoint<P>>;
