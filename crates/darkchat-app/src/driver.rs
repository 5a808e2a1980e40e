//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use darkchat_client::{Inbound, Outbound};
use darkchat_proto::Identity;

use crate::{App, AppEvent};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal client and in
/// simulation.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, a Socket.IO gateway over
///   WebSocket, reqwest for the REST auth endpoints
/// - **Simulation**: an in-memory backend answering every request
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next input event.
    ///
    /// Returns an available event or `None` if none is ready.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Hand a message to the gateway.
    ///
    /// Returns `false` if there is no open connection; the message is dropped.
    fn send(&mut self, message: Outbound) -> impl Future<Output = bool> + Send;

    /// Next gateway notification, without waiting.
    fn recv(&mut self) -> Option<Inbound>;

    /// Open the event socket as `identity`.
    ///
    /// Completion of the namespace handshake is reported later through
    /// [`Inbound::Connected`].
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    fn connect(&mut self, identity: &Identity) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the event socket. No-op if already closed.
    fn disconnect(&mut self);

    /// Check if the event socket is open.
    fn is_connected(&self) -> bool;

    /// Exchange credentials for an identity.
    fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, Self::Error>> + Send;

    /// Create an account.
    fn register(
        &mut self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Identity persisted by an earlier run.
    fn stored_identity(&self) -> Option<Identity>;

    /// Persist `identity`.
    fn store_identity(&mut self, identity: &Identity) -> Result<(), Self::Error>;

    /// Remove the persisted identity.
    fn clear_identity(&mut self) -> Result<(), Self::Error>;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
