//! # Workpull
//!
//! A pull-based work distribution core built on actors.
//!
//! This crate provides:
//! - A dispatcher holding a bounded FIFO work queue and a registry of workers
//! - Workers that register, ask for one item at a time and report completion
//! - Recovery of in-flight work when a worker terminates
//! - Periodic prodding of an external feeder while the queue stays dry

pub mod actor;
pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod port;

// Re-export commonly used types
pub use actor::{
    Dispatcher, DispatcherArguments, DispatcherMessage, DispatcherSnapshot, FeederMessage, Supervisor,
    SupervisorMessage, SystemHealth, Worker, WorkerArguments, WorkerMessage
};
pub use config::{DispatcherConfig, Settings};
pub use domain::{
    error::DispatchError,
    work::{Originator, Payload, QueuedWork, WorkerId}
};
pub use port::{
    handler::{Completion, WorkHandler},
    metrics::Metrics
};
