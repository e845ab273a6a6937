use async_trait::async_trait;
use tracing::{Level, event};

use crate::{
    domain::{constant::hello, error::DispatchError, work::Originator},
    port::handler::{Completion, WorkHandler}
};

/// Demo handler: logs each payload and finishes straight away
#[derive(Debug, Default)]
pub struct HelloHandler {
    greeted: u64
}

impl HelloHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkHandler for HelloHandler {
    type Payload = String;
    type Other = ();

    async fn handle_work(
        &mut self,
        work: String,
        originator: Originator,
        completion: Completion
    ) -> Result<(), DispatchError> {
        self.greeted += 1;
        event!(Level::INFO, event = hello::GREETED, work = %work, originator = ?originator.id(), greeted = self.greeted);
        completion.complete()
    }
}
