//! Collaborator implementations: metrics sinks, a demo handler and a demo feeder

pub mod feeder;
pub mod hello;
pub mod metrics;
