//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: request/reply pairing for the gateway
//! - [`Driver`]: Platform-specific I/O

use darkchat_client::{Inbound, Outbound};

use crate::{App, AppAction, AppEvent, Bridge, Driver};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
pub struct Runtime<D: Driver> {
    driver: D,
    app: App,
    bridge: Bridge,
}

impl<D: Driver> Runtime<D> {
    /// Create a new runtime with the given driver.
    pub fn new(driver: D) -> Self {
        Self { driver, app: App::new(), bridge: Bridge::new() }
    }

    /// Run the main event loop.
    ///
    /// This is the core orchestration loop that:
    /// 1. Restores a persisted session, if any
    /// 2. Polls for input events from the driver
    /// 3. Drains gateway notifications through the bridge
    /// 4. Executes the actions the App produces
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let mut quit = self.start().await?;
        while !quit {
            quit = self.step().await?;
        }

        self.driver.stop();
        Ok(())
    }

    /// Render the first frame and restore a persisted session.
    ///
    /// Returns `true` if the application should quit.
    pub async fn start(&mut self) -> Result<bool, D::Error> {
        self.driver.render(&self.app)?;

        match self.driver.stored_identity() {
            Some(identity) => self.dispatch(AppEvent::SessionRestored(identity)).await,
            None => Ok(false),
        }
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await?
            && self.dispatch(event).await?
        {
            return Ok(true);
        }

        while let Some(inbound) = self.driver.recv() {
            if matches!(inbound, Inbound::Closed { .. }) {
                self.driver.disconnect();
            }
            for event in self.bridge.handle_inbound(inbound) {
                if self.dispatch(event).await? {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Feed one event to the App and execute the resulting actions.
    ///
    /// Returns `true` if the application should quit.
    pub async fn dispatch(&mut self, event: AppEvent) -> Result<bool, D::Error> {
        let actions = self.app.handle(event);
        self.process_actions(actions).await
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    pub async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                let events = match action {
                    AppAction::Render => {
                        self.driver.render(&self.app)?;
                        vec![]
                    },
                    AppAction::Quit => return Ok(true),
                    AppAction::Connect { identity } => {
                        self.bridge.clear();
                        match self.driver.connect(&identity).await {
                            Ok(()) => vec![],
                            Err(error) => {
                                tracing::warn!(%error, "connect failed");
                                vec![AppEvent::Disconnected { reason: error.to_string() }]
                            },
                        }
                    },
                    AppAction::Disconnect => {
                        self.driver.disconnect();
                        self.bridge.clear();
                        vec![]
                    },
                    AppAction::Subscribe { event } => {
                        if !self.driver.send(Outbound::Subscribe(event)).await {
                            tracing::debug!(%event, "subscribe dropped, not connected");
                        }
                        vec![]
                    },
                    AppAction::Request { id, request } => match self.bridge.outbound(id, &request) {
                        Ok(message) => {
                            if self.driver.send(message).await {
                                vec![]
                            } else {
                                self.bridge.dropped(id)
                            }
                        },
                        Err(error) => vec![AppEvent::RequestFailed {
                            id,
                            kind: request.kind(),
                            message: error.to_string(),
                        }],
                    },
                    AppAction::Login { email, password } => {
                        match self.driver.login(&email, &password).await {
                            Ok(identity) => vec![AppEvent::LoginSucceeded(identity)],
                            Err(error) => vec![AppEvent::LoginFailed { message: error.to_string() }],
                        }
                    },
                    AppAction::Register { display_name, email, password } => {
                        match self.driver.register(&display_name, &email, &password).await {
                            Ok(()) => vec![AppEvent::Registered],
                            Err(error) => {
                                vec![AppEvent::RegisterFailed { message: error.to_string() }]
                            },
                        }
                    },
                    AppAction::StoreIdentity(identity) => {
                        match self.driver.store_identity(&identity) {
                            Ok(()) => vec![],
                            Err(error) => {
                                tracing::warn!(%error, "could not persist session");
                                vec![AppEvent::Error { message: format!("could not save session: {error}") }]
                            },
                        }
                    },
                    AppAction::ClearIdentity => match self.driver.clear_identity() {
                        Ok(()) => vec![],
                        Err(error) => {
                            tracing::warn!(%error, "could not remove persisted session");
                            vec![AppEvent::Error {
                                message: format!("could not remove saved session: {error}"),
                            }]
                        },
                    },
                };

                for event in events {
                    pending_actions.extend(self.app.handle(event));
                }
            }
        }
        Ok(false)
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
