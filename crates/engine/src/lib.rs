//! The Verdant decision engine.
//!
//! One bounded decision cycle per call: context snapshot in, natural
//! language decision out, with multi-round tool use in between. See
//! [`cycle::DecisionEngine`] for the state machine.

pub mod cycle;

pub use cycle::{DecisionEngine, SKIPPED_ROUND_CAP};
