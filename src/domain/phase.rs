//! Worker phases and the (phase, message) transition table

/// Worker phase. A worker starts idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerPhase {
    #[default]
    Idle,
    Busy
}

/// The kind of message a worker received, stripped of its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    WorkToBeDone,
    WorkIsReady,
    WorkComplete,
    Other
}

/// What the worker must do in response to a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Hand the payload to the concrete handler
    Execute,
    /// Ask the dispatcher for work
    RequestWork,
    /// Count the completion, report it and ask for more work straight away
    ReportDone,
    /// Pass the message to the handler's `handle_any`
    Delegate,
    /// Log and drop a message that cannot be valid in this phase
    Violation(Anomaly),
    /// Drop a harmless notice
    Ignore
}

/// Protocol violations a worker can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// Work arrived while another item is still running
    WorkWhileBusy,
    /// A completion arrived with nothing running
    CompletionWhileIdle
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub next:   WorkerPhase
}

impl WorkerPhase {
    pub fn on(self, signal: Signal) -> Transition {
        use Action::*;
        use WorkerPhase::*;

        let (action, next) = match (self, signal) {
            (Idle, Signal::WorkToBeDone) => (Execute, Busy),
            (Idle, Signal::WorkIsReady) => (RequestWork, Idle),
            (Idle, Signal::WorkComplete) => (Violation(Anomaly::CompletionWhileIdle), Idle),
            (Busy, Signal::WorkComplete) => (ReportDone, Idle),
            (Busy, Signal::WorkToBeDone) => (Violation(Anomaly::WorkWhileBusy), Busy),
            (Busy, Signal::WorkIsReady) => (Ignore, Busy),
            (phase, Signal::Other) => (Delegate, phase)
        };

        Transition { action, next }
    }
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::WorkWhileBusy => write!(f, "asked to work whilst already working"),
            Anomaly::CompletionWhileIdle => write!(f, "work completion reported whilst idle")
        }
    }
}
