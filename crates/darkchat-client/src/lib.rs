//! Client
//!
//! I/O-facing pieces of the DarkChat client: the persisted session, the REST
//! authentication API and the event-socket gateway.
//!
//! # Architecture
//!
//! Nothing here makes product decisions. The session store only remembers
//! who is signed in; the gateway only moves packets. Conversation state and
//! reconciliation live in `darkchat-app`, which talks to this crate through
//! the [`Outbound`] and [`Inbound`] message types.
//!
//! # Components
//!
//! - [`SessionStore`]: process-wide identity, persisted across restarts
//! - [`ClientConfig`]: endpoints and file locations
//! - [`Outbound`] / [`Inbound`]: messages exchanged with the gateway task
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::Gateway`]: idempotent connect/disconnect wrapper
//! - [`transport::connect`]: open the Socket.IO connection
//! - [`api::AuthApi`]: `POST /user/login` and `POST /user/register`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod gateway;
mod session;

#[cfg(feature = "transport")]
pub mod api;
#[cfg(feature = "transport")]
pub mod transport;

pub use config::ClientConfig;
pub use darkchat_proto::Identity;
pub use error::{GatewayError, SessionError};
pub use gateway::{Inbound, Outbound};
pub use session::SessionStore;
