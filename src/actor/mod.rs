//! Actor-based work distribution
//!
//! This module implements a pull-based master/worker architecture using Ractor:
//! a dispatcher owning the queue, workers that ask for one item at a time, and a
//! supervisor wiring a demo system together.

pub mod dispatcher;
pub mod message;
pub mod supervisor;
pub mod worker;

pub use dispatcher::*;
pub use message::*;
pub use supervisor::*;
pub use worker::*;
