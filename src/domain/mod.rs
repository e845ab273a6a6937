//! Domain model: work items, the dispatch book and the worker phase machine

pub mod book;
pub mod constant;
pub mod error;
pub mod phase;
pub mod work;
