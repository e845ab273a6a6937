//! Domain Events - Structured events for internal monitoring and debugging

/// Dispatcher Actor Events
pub mod dispatcher {
    pub const DISPATCHER_STARTED: &str = "dispatcher.started";
    pub const DISPATCHER_STOPPED: &str = "dispatcher.stopped";
    pub const WORK_ACCEPTED: &str = "work.accepted";
    pub const WORK_REJECTED: &str = "work.rejected";
    pub const WORK_ASSIGNED: &str = "work.assigned";
    pub const WORK_DELIVERY_FAILED: &str = "work.delivery_failed";
    pub const WORK_REQUEST_IGNORED: &str = "work.request_ignored";
    pub const WORK_DONE: &str = "work.done";
    pub const WORK_REQUEUED: &str = "work.requeued";
    pub const WORKER_REGISTERED: &str = "worker.registered";
    pub const WORKER_TERMINATED: &str = "worker.terminated";
    pub const WORKERS_NOTIFIED: &str = "workers.notified";
    pub const UNKNOWN_WORKER: &str = "worker.unknown";
    pub const FEEDER_ASKED: &str = "feeder.asked";
    pub const FEEDER_PRODDED: &str = "feeder.prodded";
    pub const FEEDER_UNREACHABLE: &str = "feeder.unreachable";
    pub const SNAPSHOT_FAILED: &str = "snapshot.failed";
}

/// Worker Actor Events
pub mod worker {
    pub const WORKER_STARTED: &str = "worker.started";
    pub const WORKER_STOPPED: &str = "worker.stopped";
    pub const WORK_RECEIVED: &str = "work.received";
    pub const WORK_REQUESTED: &str = "work.requested";
    pub const WORK_COMPLETED: &str = "work.completed";
    pub const PROTOCOL_VIOLATION: &str = "protocol.violation";
    pub const NOTICE_IGNORED: &str = "notice.ignored";
    pub const UNSOLICITED_MESSAGE: &str = "message.unsolicited";
    pub const DISPATCHER_UNREACHABLE: &str = "dispatcher.unreachable";
}

/// Supervisor Actor Events
pub mod supervisor {
    pub const SUPERVISOR_STARTED: &str = "supervisor.started";
    pub const CHILDREN_SPAWNING: &str = "children.spawning";
    pub const CHILDREN_SPAWNED: &str = "children.spawned";
    pub const CHILDREN_SPAWN_FAILED: &str = "children.spawn_failed";
    pub const CHILD_TERMINATED: &str = "child.terminated";
    pub const WORKER_REPLACED: &str = "worker.replaced";
    pub const SYSTEM_INITIALIZED: &str = "system.initialized";
    pub const SYSTEM_SHUTDOWN_STARTED: &str = "system.shutdown_started";
    pub const SYSTEM_SHUTDOWN_COMPLETED: &str = "system.shutdown_completed";
    pub const HEALTH_CHECK_COMPLETED: &str = "health.check_completed";
    pub const WORK_SUBMITTED: &str = "work.submitted";
}

/// Feeder Actor Events
pub mod feeder {
    pub const FEEDER_STARTED: &str = "feeder.started";
    pub const WORK_FED: &str = "work.fed";
    pub const FEEDER_EXHAUSTED: &str = "feeder.exhausted";
    pub const SUBMIT_FAILED: &str = "submit.failed";
}

/// Demo handler events
pub mod hello {
    pub const GREETED: &str = "hello.greeted";
}
