//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`darkchat_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Requests are answered synchronously by a [`SharedBackend`]. Replies can be
//! held back and released in any order to exercise stale-reply handling.

use std::collections::{HashSet, VecDeque};

use darkchat_app::{App, AppEvent, Driver, KeyInput, Runtime};
use darkchat_client::{Inbound, Outbound};
use darkchat_proto::{EventName, Identity};
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::{
    SharedBackend,
    invariants::{ClientSnapshot, InvariantRegistry, SystemSnapshot},
};

/// Step limit for [`run_until_idle`].
const MAX_STEPS: usize = 10_000;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`darkchat_app::Runtime`]
/// orchestration code runs in both production TUI and simulation tests.
pub struct SimDriver {
    name: String,
    backend: SharedBackend,
    pending_events: VecDeque<AppEvent>,
    inbound: VecDeque<Inbound>,
    held: Vec<Inbound>,
    hold_replies: bool,
    sent: Vec<Outbound>,
    connected_as: Option<Identity>,
    subscriptions: HashSet<EventName>,
    stored: Option<Identity>,
    offline: bool,
    renders: usize,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver named `name` talking to `backend`.
    pub fn new(name: &str, backend: SharedBackend) -> Self {
        Self {
            name: name.to_owned(),
            backend,
            pending_events: VecDeque::new(),
            inbound: VecDeque::new(),
            held: Vec::new(),
            hold_replies: false,
            sent: Vec::new(),
            connected_as: None,
            subscriptions: HashSet::new(),
            stored: None,
            offline: false,
            renders: 0,
            invariants: None,
        }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Start with `identity` already persisted.
    #[must_use]
    pub fn with_stored_identity(mut self, identity: Identity) -> Self {
        self.stored = Some(identity);
        self
    }

    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&mut self, event: AppEvent) {
        self.pending_events.push_back(event);
    }

    /// Inject a key press.
    pub fn press(&mut self, key: KeyInput) {
        self.inject_event(AppEvent::Key(key));
    }

    /// Inject one key press per character of `text`.
    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyInput::Char(c));
        }
    }

    /// Hold replies until released.
    pub fn hold_replies(&mut self, hold: bool) {
        self.hold_replies = hold;
    }

    /// Deliver held replies in the order they were produced.
    pub fn release_held(&mut self) {
        self.inbound.extend(self.held.drain(..));
    }

    /// Deliver held replies newest first.
    pub fn release_held_reversed(&mut self) {
        self.inbound.extend(self.held.drain(..).rev());
    }

    /// Deliver held replies in an order drawn from `seed`.
    pub fn release_held_shuffled(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.held.shuffle(&mut rng);
        self.release_held();
    }

    /// Number of held replies.
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Refuse future connection attempts.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Simulate the server closing the connection.
    pub fn drop_connection(&mut self, reason: &str) {
        if self.connected_as.take().is_some() {
            self.subscriptions.clear();
            self.held.clear();
            self.inbound.push_back(Inbound::Closed { reason: reason.to_owned() });
        }
    }

    /// Take all captured outgoing messages.
    pub fn take_sent(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.sent)
    }

    /// Events of every request sent so far, without taking them.
    pub fn sent_events(&self) -> Vec<EventName> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                Outbound::Request { event, .. } => Some(*event),
                Outbound::Subscribe(_) => None,
            })
            .collect()
    }

    /// Identity currently persisted.
    pub fn stored(&self) -> Option<&Identity> {
        self.stored.as_ref()
    }

    /// Number of frames rendered.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Shared backend.
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        if !self.pending_events.is_empty() || !self.inbound.is_empty() {
            return true;
        }
        self.connected_as.as_ref().is_some_and(|me| self.backend.lock().has_pushes(&me.user_id))
    }

    /// Snapshot of `app` for invariant checking.
    pub fn snapshot_from_app(&self, app: &App) -> ClientSnapshot {
        ClientSnapshot::from_app(&self.name, app)
    }

    /// Check invariants against App state.
    pub fn check_invariants(&self, app: &App, context: &str) {
        if let Some(registry) = &self.invariants {
            let snapshot = SystemSnapshot::single(self.snapshot_from_app(app));
            registry.assert_all(&snapshot, context);
        }
    }

    /// Move queued pushes for subscribed events into the inbound queue.
    fn collect_pushes(&mut self) {
        let Some(me) = &self.connected_as else {
            return;
        };
        let pushes = self.backend.lock().take_pushes(&me.user_id);
        for (event, payload) in pushes {
            if self.subscriptions.contains(&event) {
                self.inbound.push_back(Inbound::Push { event, payload });
            } else {
                tracing::trace!(client = %self.name, %event, "dropping unsubscribed push");
            }
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        Ok(self.pending_events.pop_front())
    }

    async fn send(&mut self, message: Outbound) -> bool {
        let Some(me) = &self.connected_as else {
            return false;
        };
        let user_id = me.user_id.clone();
        self.sent.push(message.clone());

        match message {
            Outbound::Subscribe(event) => {
                self.subscriptions.insert(event);
            },
            Outbound::Request { id, event, payload } => {
                let payload = self.backend.lock().handle(&user_id, event, payload);
                let reply = Inbound::Reply { id, payload };
                if self.hold_replies {
                    self.held.push(reply);
                } else {
                    self.inbound.push_back(reply);
                }
            },
        }
        true
    }

    fn recv(&mut self) -> Option<Inbound> {
        if self.inbound.is_empty() {
            self.collect_pushes();
        }
        self.inbound.pop_front()
    }

    async fn connect(&mut self, identity: &Identity) -> Result<(), Self::Error> {
        if self.offline {
            return Err(SimDriverError("connection refused".to_owned()));
        }
        if !self.backend.lock().authenticate(identity) {
            return Err(SimDriverError("unauthorized".to_owned()));
        }

        self.connected_as = Some(identity.clone());
        self.subscriptions.clear();
        self.inbound.push_back(Inbound::Connected);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected_as = None;
        self.subscriptions.clear();
        self.held.clear();
        self.inbound.retain(|m| matches!(m, Inbound::Closed { .. }));
    }

    fn is_connected(&self) -> bool {
        self.connected_as.is_some()
    }

    async fn login(&mut self, email: &str, password: &str) -> Result<Identity, Self::Error> {
        self.backend.lock().login(email, password).map_err(|r| SimDriverError(r.message))
    }

    async fn register(
        &mut self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), Self::Error> {
        self.backend
            .lock()
            .register(display_name, email, password)
            .map_err(|r| SimDriverError(r.message))
    }

    fn stored_identity(&self) -> Option<Identity> {
        self.stored.clone()
    }

    fn store_identity(&mut self, identity: &Identity) -> Result<(), Self::Error> {
        self.stored = Some(identity.clone());
        Ok(())
    }

    fn clear_identity(&mut self) -> Result<(), Self::Error> {
        self.stored = None;
        Ok(())
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.renders += 1;
        self.check_invariants(app, &format!("after render {}", self.renders));
        Ok(())
    }

    fn stop(&mut self) {
        self.disconnect();
    }
}

/// Step `runtime` until the driver has nothing left to deliver.
///
/// Returns `true` if the App asked to quit.
pub async fn run_until_idle(runtime: &mut Runtime<SimDriver>) -> Result<bool, SimDriverError> {
    for _ in 0..MAX_STEPS {
        if !runtime.driver().has_pending() {
            return Ok(false);
        }
        if runtime.step().await? {
            return Ok(true);
        }
    }
    Err(SimDriverError(format!("not idle after {MAX_STEPS} steps")))
}

/// Start `runtime` and step it until idle.
pub async fn start(runtime: &mut Runtime<SimDriver>) -> Result<bool, SimDriverError> {
    if runtime.start().await? {
        return Ok(true);
    }
    run_until_idle(runtime).await
}
