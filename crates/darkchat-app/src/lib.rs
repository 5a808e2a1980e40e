//! Application layer for DarkChat
//!
//! Pure state machines and generic runtime for the chat client, enabling
//! deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: UI state machine (screens, conversation sync, forms, modals)
//! - [`ConversationList`]: sidebar list rebuilt from server snapshots
//! - [`RequestTracker`]: request ids and stale-reply detection
//! - [`Bridge`]: pairs gateway replies with the requests they answer
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod conversations;
mod driver;
mod error;
mod event;
mod input;
mod request;
mod runtime;
mod sequence;
mod state;
pub mod validate;
pub mod view;

pub use action::AppAction;
pub use app::App;
pub use bridge::Bridge;
pub use conversations::{ConversationList, Reconciliation};
pub use driver::Driver;
pub use error::AppError;
pub use event::AppEvent;
pub use input::{KeyInput, TextField};
pub use request::{Reply, Request, RequestId, RequestKind};
pub use runtime::Runtime;
pub use sequence::{RequestTracker, Slot};
pub use state::{
    ConnectionState, DraftFocus, GroupDraft, History, HistoryState, LoginField, LoginForm, Modal,
    RegisterField, RegisterForm, Screen, SettingsField, SettingsForm,
};
