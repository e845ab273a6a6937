//! Work items and the identities they travel with

use std::fmt::Debug;

use ractor::{ActorCell, ActorId, ActorRef, Message};

use crate::domain::error::DispatchError;

/// Identity of a registered worker
pub type WorkerId = ActorId;

/// Opaque work payload. The dispatcher never looks inside it.
pub trait Payload: Debug + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: Debug + Clone + Send + Sync + 'static {}

/// Who a worker's result should be attributed to
///
/// Travels with the work from submission to the worker so replies bypass the dispatcher.
/// An originator may be absent, in which case replies are dropped.
#[derive(Debug, Clone, Default)]
pub struct Originator(Option<ActorCell>);

impl Originator {
    /// An originator that nobody listens to
    pub fn none() -> Self {
        Self(None)
    }

    pub fn id(&self) -> Option<ActorId> {
        self.0.as_ref().map(ActorCell::get_id)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Send a typed message to the originator; a no-op when there is none
    pub fn tell<M: Message>(&self, message: M) -> Result<(), DispatchError> {
        match &self.0 {
            Some(cell) => cell.send_message(message).map_err(DispatchError::from),
            None => Ok(())
        }
    }
}

impl<M: Message> From<ActorRef<M>> for Originator {
    fn from(actor: ActorRef<M>) -> Self {
        Self(Some(actor.get_cell()))
    }
}

impl From<ActorCell> for Originator {
    fn from(cell: ActorCell) -> Self {
        Self(Some(cell))
    }
}

impl PartialEq for Originator {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Originator {}

/// A payload paired with its originator, as held by the queue and by busy workers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedWork<P> {
    pub payload:    P,
    pub originator: Originator
}

impl<P: Payload> QueuedWork<P> {
    pub fn new(payload: P, originator: impl Into<Originator>) -> Self {
        Self { payload, originator: originator.into() }
    }

    /// Work submitted without anyone to reply to
    pub fn anonymous(payload: P) -> Self {
        Self { payload, originator: Originator::none() }
    }
}
