//! Demo feeder - answers every ask with fresh UUID payloads
//!
//! An optional budget caps how many items it ever produces, after which asks are
//! answered with nothing, like an external source that has run dry.

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::{Level, event};
use uuid::Uuid;

use crate::{
    actor::message::{DispatcherMessage, FeederMessage},
    domain::{constant::feeder, work::QueuedWork}
};

/// UuidFeeder Actor State
pub struct UuidFeederState {
    /// Items left to produce; unlimited when `None`
    remaining: Option<u64>,
    /// Items produced so far
    fed:       u64
}

/// UuidFeeder Actor
pub struct UuidFeeder;

#[async_trait::async_trait]
impl Actor for UuidFeeder {
    type Arguments = Option<u64>;
    type Msg = FeederMessage<String>;
    type State = UuidFeederState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        budget: Self::Arguments
    ) -> Result<Self::State, ActorProcessingErr> {
        event!(Level::DEBUG, event = feeder::FEEDER_STARTED, budget = ?budget);
        Ok(UuidFeederState { remaining: budget, fed: 0 })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State
    ) -> Result<(), ActorProcessingErr> {
        match message {
            FeederMessage::FeedMoreWork { count, reply_to } => self.feed(count, &reply_to, state)
        }
        Ok(())
    }
}

impl UuidFeeder {
    fn feed(&self, count: usize, reply_to: &ActorRef<DispatcherMessage<String>>, state: &mut UuidFeederState) {
        let batch = match state.remaining {
            Some(remaining) => remaining.min(count as u64),
            None => count as u64
        };

        if batch == 0 {
            event!(Level::DEBUG, event = feeder::FEEDER_EXHAUSTED, fed = state.fed);
            return;
        }

        for _ in 0..batch {
            let work = QueuedWork::anonymous(Uuid::new_v4().to_string());
            if let Err(e) = reply_to.cast(DispatcherMessage::Submit(work)) {
                event!(Level::WARN, event = feeder::SUBMIT_FAILED, error = %e);
                return;
            }
            state.fed += 1;
            if let Some(remaining) = state.remaining.as_mut() {
                *remaining -= 1;
            }
        }

        event!(Level::DEBUG, event = feeder::WORK_FED, batch = batch, fed = state.fed);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ractor::rpc::{CallResult, call};

    use super::*;
    use crate::{
        actor::{
            dispatcher::{Dispatcher, DispatcherArguments},
            message::DispatcherSnapshot
        },
        config::DispatcherConfig
    };

    async fn snapshot(dispatcher: &ActorRef<DispatcherMessage<String>>) -> DispatcherSnapshot<String> {
        match call(dispatcher, |reply| DispatcherMessage::Snapshot { reply }, Some(Duration::from_secs(5))).await {
            Ok(CallResult::Success(snapshot)) => snapshot,
            _ => panic!("Snapshot call failed")
        }
    }

    #[tokio::test]
    async fn test_feeder_respects_budget() {
        let config = DispatcherConfig { tick_interval_ms: 60_000, ..DispatcherConfig::default() };
        let (dispatcher, _) = Dispatcher::<String>::start(None, DispatcherArguments::new(config)).await.unwrap();
        let (feeder, _) = Actor::spawn(None, UuidFeeder, Some(15)).await.unwrap();

        for _ in 0..3 {
            feeder.cast(FeederMessage::FeedMoreWork { count: 10, reply_to: dispatcher.clone() }).unwrap();
        }

        let mut queued = 0;
        for _ in 0..200 {
            queued = snapshot(&dispatcher).await.queued.len();
            if queued >= 15 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(queued, 15);

        let view = snapshot(&dispatcher).await;
        assert!(view.queued.iter().all(|work| Uuid::parse_str(&work.payload).is_ok() && work.originator.is_none()));

        feeder.stop(None);
        dispatcher.stop(None);
    }
}
