//! Seams between the dispatch core and its collaborators

pub mod endpoint;
pub mod handler;
pub mod metrics;
