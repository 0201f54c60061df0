//! Connection scope state machine for wearsync.
//!
//! Every sync operation walks the same lifecycle:
//!
//! ```text
//! Idle → Connecting → Connected → Executing → Closed
//!            │                                  ▲
//!            └──────── timeout / failure ───────┘
//! ```
//!
//! This module is pure: it takes events and returns the next state plus the
//! actions to perform. The I/O (opening the session, running the caller's
//! action, releasing the session) is done by sync-client. No state is
//! retained across operations; each run starts from `Idle`.

/// Lifecycle of a single scoped operation - NO I/O, just transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Nothing started yet.
    Idle,
    /// Waiting for the transport session.
    Connecting,
    /// Session established, action not yet started.
    Connected,
    /// Caller's action is running.
    Executing,
    /// Terminal. Reached on success, on action failure and on timeout.
    Closed,
}

impl ScopeState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function. The caller is responsible for executing the
    /// returned actions.
    pub fn on_event(self, event: ScopeEvent) -> (Self, Vec<ScopeAction>) {
        match (self, event) {
            (Self::Idle, ScopeEvent::Open) => (Self::Connecting, vec![ScopeAction::Connect]),

            // From Connecting
            (Self::Connecting, ScopeEvent::Established) => {
                (Self::Connected, vec![ScopeAction::RunAction])
            }
            // No session exists, so there is nothing to release
            (Self::Connecting, ScopeEvent::TimedOut) => {
                (Self::Closed, vec![ScopeAction::ReportTimeout])
            }
            (Self::Connecting, ScopeEvent::ConnectFailed) => {
                (Self::Closed, vec![ScopeAction::ReportFailure])
            }

            (Self::Connected, ScopeEvent::ActionStarted) => (Self::Executing, vec![]),

            // From Executing: release is unconditional
            (Self::Executing, ScopeEvent::ActionCompleted) => {
                (Self::Closed, vec![ScopeAction::Release])
            }
            (Self::Executing, ScopeEvent::ActionFailed) => {
                (Self::Closed, vec![ScopeAction::Release])
            }

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check whether the operation has finished.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check whether a live session is held in this state.
    pub fn holds_session(&self) -> bool {
        matches!(self, Self::Connected | Self::Executing)
    }
}

impl Default for ScopeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events in a scoped operation's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEvent {
    /// Caller asked for a scoped operation.
    Open,
    /// Transport session established.
    Established,
    /// Session not established within the bound.
    TimedOut,
    /// Transport refused the session.
    ConnectFailed,
    /// Caller's action began running.
    ActionStarted,
    /// Caller's action returned.
    ActionCompleted,
    /// Caller's action failed or panicked.
    ActionFailed,
}

/// Actions the scope driver must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeAction {
    /// Open a transport session.
    Connect,
    /// Invoke the caller's action with the session.
    RunAction,
    /// Release the session.
    Release,
    /// Surface a connection timeout.
    ReportTimeout,
    /// Surface a connection failure.
    ReportFailure,
}
