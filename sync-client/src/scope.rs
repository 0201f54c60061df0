//! Scoped transport sessions.
//!
//! [`ConnectionScope::with_connection`] acquires a session within a bounded
//! timeout, runs the caller's action exactly once, and releases the session
//! on every exit path: success, action error, and action panic. There is no
//! pooling; every operation pays for its own session.
//!
//! The lifecycle is driven by the pure [`ScopeState`] machine from sync-core.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use wearsync_core::{ScopeAction, ScopeEvent, ScopeState};

use crate::transport::{Session, Transport, TransportError};

/// Failure to acquire a session.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No session within the bound; the action was not run.
    #[error("no session within {after:?}")]
    Timeout {
        /// The bound that elapsed.
        after: Duration,
    },

    /// The transport refused the session; the action was not run.
    #[error("session refused: {0}")]
    Failed(#[source] TransportError),
}

/// Acquire → run → release wrapper around a [`Transport`].
pub struct ConnectionScope<T: Transport> {
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: Transport> Clone for ConnectionScope<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            timeout: self.timeout,
        }
    }
}

impl<T: Transport> ConnectionScope<T> {
    /// Create a scope over a shared transport.
    pub fn new(transport: Arc<T>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// The session timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Run `action` with a freshly acquired session.
    ///
    /// Returns the connection failure (converted into `E`) without invoking
    /// `action` when no session is established in time. Otherwise returns
    /// whatever `action` returns, after the session has been released. A
    /// panic inside `action` is resumed once the session is released.
    pub async fn with_connection<F, Fut, R, E>(&self, action: F) -> Result<R, E>
    where
        F: FnOnce(T::Session) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<ConnectionError>,
    {
        let state = self.advance(ScopeState::new(), ScopeEvent::Open).0;

        let session = match tokio::time::timeout(self.timeout, self.transport.connect()).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                self.advance(state, ScopeEvent::ConnectFailed);
                tracing::warn!(error = %e, "failed to open transport session");
                return Err(ConnectionError::Failed(e).into());
            }
            Err(_) => {
                self.advance(state, ScopeEvent::TimedOut);
                tracing::warn!(timeout = ?self.timeout, "timed out opening transport session");
                return Err(ConnectionError::Timeout {
                    after: self.timeout,
                }
                .into());
            }
        };

        let (state, _) = self.advance(state, ScopeEvent::Established);
        let (state, _) = self.advance(state, ScopeEvent::ActionStarted);

        // Invoke inside the guarded future so a panic while building it is caught too
        let action_session = session.clone();
        let outcome = AssertUnwindSafe(async move { action(action_session).await })
            .catch_unwind()
            .await;

        let event = match &outcome {
            Ok(Ok(_)) => ScopeEvent::ActionCompleted,
            Ok(Err(_)) | Err(_) => ScopeEvent::ActionFailed,
        };
        let (_, actions) = self.advance(state, event);
        if actions.contains(&ScopeAction::Release) {
            if let Err(e) = session.disconnect().await {
                tracing::warn!(error = %e, "failed to release transport session");
            }
        }

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    fn advance(&self, state: ScopeState, event: ScopeEvent) -> (ScopeState, Vec<ScopeAction>) {
        let (next, actions) = state.on_event(event);
        tracing::trace!(from = ?state, to = ?next, ?event, "scope transition");
        (next, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockNetwork, MockTransport};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wearsync_types::SyncPath;

    fn scope(timeout: Duration) -> (MockNetwork, ConnectionScope<MockTransport>) {
        let network = MockNetwork::new();
        let transport = network.add_node("watch", "Watch");
        (network, ConnectionScope::new(Arc::new(transport), timeout))
    }

    // ===========================================
    // Happy Path
    // ===========================================

    #[tokio::test]
    async fn runs_action_once_and_releases() {
        let (network, scope) = scope(Duration::from_secs(30));
        let calls = AtomicUsize::new(0);

        let value = scope
            .with_connection(|session| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert!(session.is_open());
                    Ok::<_, ConnectionError>(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(network.sessions_opened("watch"), 1);
        assert_eq!(network.sessions_released("watch"), 1);
    }

    #[tokio::test]
    async fn session_is_closed_after_scope() {
        let (_, scope) = scope(Duration::from_secs(30));

        let leaked = scope
            .with_connection(|session| async move { Ok::<_, ConnectionError>(session) })
            .await
            .unwrap();

        let result = leaked.get_data_item(SyncPath::Weather).await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn each_operation_acquires_its_own_session() {
        let (network, scope) = scope(Duration::from_secs(30));
        for _ in 0..3 {
            scope
                .with_connection(|_| async { Ok::<_, ConnectionError>(()) })
                .await
                .unwrap();
        }
        assert_eq!(network.sessions_opened("watch"), 3);
        assert_eq!(network.sessions_released("watch"), 3);
    }

    // ===========================================
    // Failure Paths
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn timeout_never_invokes_action() {
        let (network, scope) = scope(Duration::from_secs(30));
        network.stall_connect("watch");
        let calls = AtomicUsize::new(0);

        let result = scope
            .with_connection(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ConnectionError>(()) }
            })
            .await;

        assert!(matches!(
            result,
            Err(ConnectionError::Timeout { after }) if after == Duration::from_secs(30)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(network.sessions_released("watch"), 0);
    }

    #[tokio::test]
    async fn refused_session_never_invokes_action() {
        let (network, scope) = scope(Duration::from_secs(30));
        network.fail_next_connect("watch", "radio off");
        let calls = AtomicUsize::new(0);

        let result = scope
            .with_connection(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ConnectionError>(()) }
            })
            .await;

        assert!(matches!(result, Err(ConnectionError::Failed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn action_error_still_releases() {
        #[derive(Debug)]
        enum TestError {
            Connection,
            Action,
        }
        impl From<ConnectionError> for TestError {
            fn from(_: ConnectionError) -> Self {
                TestError::Connection
            }
        }

        let (network, scope) = scope(Duration::from_secs(30));
        let result: Result<(), TestError> = scope
            .with_connection(|_| async { Err(TestError::Action) })
            .await;

        assert!(matches!(result, Err(TestError::Action)));
        assert_eq!(network.sessions_released("watch"), 1);
    }

    #[tokio::test]
    async fn action_panic_still_releases() {
        let (network, scope) = scope(Duration::from_secs(30));
        let scope_for_task = scope.clone();

        let joined = tokio::spawn(async move {
            scope_for_task
                .with_connection(|_| async {
                    if true {
                        panic!("action blew up");
                    }
                    Ok::<_, ConnectionError>(())
                })
                .await
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(network.sessions_opened("watch"), 1);
        assert_eq!(network.sessions_released("watch"), 1);
    }

    #[tokio::test]
    async fn panic_before_action_future_still_releases() {
        let (network, scope) = scope(Duration::from_secs(30));
        let scope_for_task = scope.clone();

        let joined = tokio::spawn(async move {
            scope_for_task
                .with_connection(|_| -> std::future::Ready<Result<(), ConnectionError>> {
                    panic!("action failed to start")
                })
                .await
        })
        .await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(network.sessions_opened("watch"), 1);
        assert_eq!(network.sessions_released("watch"), 1);
    }
}
