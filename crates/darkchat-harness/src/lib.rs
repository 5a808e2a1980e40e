//! Deterministic simulation harness for the DarkChat client.
//!
//! An in-memory backend and a [`darkchat_app::Driver`] implementation that
//! runs the production [`darkchat_app::Runtime`] without a terminal or a
//! network. Several simulated clients can share one backend, so pushes
//! between users are exercised end to end.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! conversation invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_backend;
pub mod sim_driver;

pub use invariants::{
    ActiveConversationListed, ClientSnapshot, ConversationSnapshot, HistoryMatchesActive,
    Invariant, InvariantRegistry, InvariantResult, SingleDirectPerCounterpart,
    SyntheticOnlyWhenActive, SystemSnapshot, UniqueMessageIds, Violation,
};
pub use sim_backend::{Rejection, SharedBackend, SimBackend};
pub use sim_driver::{SimDriver, SimDriverError, run_until_idle, start};
