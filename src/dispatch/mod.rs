//! Event dispatch core
//!
//! A typed publish/subscribe bus. Every server message is published twice:
//! once in the cancelable [`Phase::Pre`] phase before the host runs its own
//! default handling, and once in the [`Phase::Final`] phase after it. All
//! other components talk to each other only through this bus.

pub mod bus;

pub use bus::{EmissionResult, EventBus, Handler, Invocation, Phase, Verdict};
