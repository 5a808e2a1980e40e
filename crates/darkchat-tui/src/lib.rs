//! Terminal UI for DarkChat
//!
//! A thin shell over [`darkchat_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`darkchat_app::Runtime`].
//!
//! This crate only handles terminal input, rendering, and wiring the gateway,
//! auth API and session store into the driver.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod terminal;
pub mod ui;

pub use darkchat_app::{App, AppAction, AppEvent, Bridge, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
