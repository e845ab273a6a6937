use std::fmt::{self, Debug};

use async_trait::async_trait;
use tracing::{Level, event};

use crate::domain::{
    constant::worker,
    error::DispatchError,
    work::{Originator, Payload}
};

/// One-shot signal that the current item is finished
///
/// Handed to [`WorkHandler::handle_work`]. Completing sends the worker its internal
/// "work complete" message; the worker stays busy until then. It may be moved into a
/// spawned task so the work itself runs off the worker's mailbox.
pub struct Completion {
    signal: Box<dyn FnOnce() -> Result<(), DispatchError> + Send + Sync>
}

impl Completion {
    pub fn new(signal: impl FnOnce() -> Result<(), DispatchError> + Send + Sync + 'static) -> Self {
        Self { signal: Box::new(signal) }
    }

    pub fn complete(self) -> Result<(), DispatchError> {
        (self.signal)()
    }
}

impl Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}

/// Concrete behaviour plugged into a worker
///
/// The worker owns the phase machine; implementations only see the payloads and the
/// messages nobody else claimed.
#[async_trait]
pub trait WorkHandler: Send + 'static {
    /// What this handler works on
    type Payload: Payload;

    /// Unsolicited messages this handler accepts besides work
    type Other: Debug + Send + 'static;

    /// Start working on `work`, attributing results to `originator`
    ///
    /// Call `completion.complete()` once done, now or later. Returning an error stops the
    /// worker, and the dispatcher puts the item back in the queue.
    async fn handle_work(
        &mut self,
        work: Self::Payload,
        originator: Originator,
        completion: Completion
    ) -> Result<(), DispatchError>;

    /// Messages outside the work protocol, in either phase
    async fn handle_any(&mut self, message: Self::Other) -> Result<(), DispatchError> {
        event!(Level::WARN, event = worker::UNSOLICITED_MESSAGE, message = ?message);
        Ok(())
    }
}
