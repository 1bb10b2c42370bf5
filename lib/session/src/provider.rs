//! The session provider, single owner of [`SessionState`].
//!
//! One provider is created at application bootstrap and lives for the
//! whole process. It initializes the session from the credential store,
//! re-validates it on a timer while authenticated, and exposes
//! `refresh`, `logout`, and `establish` as the only ways the state ever
//! changes. Consumers subscribe through a watch channel, so every
//! transition is observed as a single whole-value assignment.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::resolver::SessionResolver;
use crate::routes::{Navigator, SIGN_IN_PATH};
use crate::state::SessionState;
use crate::store::{Credential, CredentialStore};

/// Owner of the current session for the application lifetime.
///
/// Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct SessionProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    store: Arc<dyn CredentialStore>,
    resolver: Arc<dyn SessionResolver>,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    /// Bumped by `logout` and `establish`. A refresh snapshots the value
    /// before resolving and discards its result if it changed meanwhile,
    /// so a stale resolution can never resurrect a session.
    epoch: AtomicU64,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionProvider {
    /// Creates a provider in the `Uninitialized` state.
    ///
    /// Most callers want [`SessionProvider::start`], which also runs the
    /// initial refresh.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        resolver: Arc<dyn SessionResolver>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            inner: Arc::new(ProviderInner {
                store,
                resolver,
                navigator,
                config,
                state,
                epoch: AtomicU64::new(0),
                refresh_task: Mutex::new(None),
            }),
        }
    }

    /// Creates a provider and resolves the persisted credential, the
    /// startup path of the application shell.
    pub async fn start(
        store: Arc<dyn CredentialStore>,
        resolver: Arc<dyn SessionResolver>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        let provider = Self::new(store, resolver, navigator, config);
        provider.refresh().await;
        provider
    }

    /// Returns a subscription to session state changes.
    ///
    /// The receiver always holds the latest state; `changed()` wakes
    /// gates and headers on every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Re-validates the session against the identity endpoint.
    ///
    /// Overlapping calls are last-write-wins; a completion whose epoch
    /// is stale (a logout or new sign-in happened mid-flight) is
    /// discarded without touching the state.
    pub async fn refresh(&self) {
        let inner = &self.inner;
        let epoch = inner.epoch.load(Ordering::SeqCst);

        // Only the very first resolution is user-visible as a loading
        // state; background refreshes keep the current view stable.
        if matches!(*inner.state.borrow(), SessionState::Uninitialized) {
            inner.state.send_replace(SessionState::Loading);
        }

        let credential = inner.store.get();
        let outcome = inner.resolver.resolve(credential).await;

        if inner.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("discarding stale session resolution");
            return;
        }

        match outcome {
            Ok(user) => self.commit(SessionState::Authenticated(user)),
            Err(SessionError::NoCredential | SessionError::Rejected) => {
                self.commit(SessionState::Anonymous);
            }
            Err(SessionError::MalformedProfile { reason }) => {
                tracing::error!(%reason, "identity endpoint violated its contract");
                self.commit(SessionState::Anonymous);
            }
            Err(SessionError::Transient { reason }) => {
                // A flaky network must not log out an authenticated
                // user, and must not fabricate a session either.
                if self.inner.state.borrow().is_authenticated() {
                    tracing::warn!(%reason, "session refresh failed, keeping current session");
                } else {
                    tracing::warn!(%reason, "session refresh failed with no session to keep");
                    self.commit(SessionState::Anonymous);
                }
            }
        }
    }

    /// Stores a freshly-issued credential and resolves it into a
    /// session. Used by the sign-in flow after a successful login.
    pub async fn establish(&self, credential: Credential) {
        // Anything still in flight belongs to the previous credential.
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.store.set(credential);
        self.refresh().await;
    }

    /// Ends the session: clears the credential, publishes `Anonymous`,
    /// and navigates to the sign-in page. Cannot fail, and safe to call
    /// in any state.
    pub fn logout(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.cancel_refresh_task();
        self.inner.store.remove();
        self.inner.state.send_replace(SessionState::Anonymous);
        self.inner.navigator.navigate(SIGN_IN_PATH);
        tracing::debug!("session ended");
    }

    fn commit(&self, next: SessionState) {
        let authenticated = next.is_authenticated();
        self.inner.state.send_replace(next);
        if authenticated {
            self.ensure_refresh_task();
        } else {
            self.cancel_refresh_task();
        }
    }

    /// Keeps the session warm and notices server-side revocation while
    /// authenticated.
    fn ensure_refresh_task(&self) {
        let mut guard = self.inner.refresh_task.lock();
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let provider = self.clone();
        *guard = Some(tokio::spawn(async move {
            loop {
                let mut wait = provider.inner.config.refresh_interval();
                let jitter_secs = provider.inner.config.refresh_jitter().as_secs();
                if jitter_secs > 0 {
                    let extra = rand::rng().random_range(0..=jitter_secs);
                    wait += Duration::from_secs(extra);
                }
                tokio::time::sleep(wait).await;
                tracing::debug!("background session refresh");
                provider.refresh().await;
            }
        }));
    }

    fn cancel_refresh_task(&self) {
        if let Some(handle) = self.inner.refresh_task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::store::InMemoryCredentialStore;
    use crate::user::User;
    use astroneko_core::UserId;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn manager() -> User {
        User {
            id: UserId::new(5),
            name: "Sara Chen".to_string(),
            email: "sara.chen@astroneko.coffee".to_string(),
            role: Role::Manager,
            loyalty_points: None,
            is_active: true,
            avatar: None,
        }
    }

    enum Step {
        Ready(Result<User, SessionError>),
        Wait(oneshot::Receiver<Result<User, SessionError>>),
    }

    /// Resolver that replays a script, then a fallback. Honors the
    /// resolver contract of clearing the store on rejection.
    struct ScriptedResolver {
        steps: Mutex<VecDeque<Step>>,
        fallback: Result<User, SessionError>,
        calls: AtomicUsize,
        store: Option<Arc<InMemoryCredentialStore>>,
    }

    impl ScriptedResolver {
        fn with_fallback(fallback: Result<User, SessionError>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(VecDeque::new()),
                fallback,
                calls: AtomicUsize::new(0),
                store: None,
            })
        }

        fn scripted(steps: Vec<Step>, store: Option<Arc<InMemoryCredentialStore>>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                fallback: Err(SessionError::NoCredential),
                calls: AtomicUsize::new(0),
                store,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionResolver for ScriptedResolver {
        async fn resolve(&self, _credential: Option<Credential>) -> Result<User, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().pop_front();
            let result = match step {
                Some(Step::Ready(result)) => result,
                Some(Step::Wait(gate)) => gate.await.expect("resolution gate dropped"),
                None => self.fallback.clone(),
            };
            if let Err(SessionError::Rejected | SessionError::MalformedProfile { .. }) = &result {
                if let Some(store) = &self.store {
                    store.remove();
                }
            }
            result
        }
    }

    struct RecordingNavigator {
        paths: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                paths: Mutex::new(Vec::new()),
            })
        }

        fn paths(&self) -> Vec<String> {
            self.paths.lock().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.paths.lock().push(path.to_string());
        }
    }

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            refresh_jitter_seconds: 0,
            ..SessionConfig::default()
        }
    }

    fn provider_with(
        store: Arc<InMemoryCredentialStore>,
        resolver: Arc<ScriptedResolver>,
        navigator: Arc<RecordingNavigator>,
    ) -> SessionProvider {
        SessionProvider::new(store, resolver, navigator, quiet_config())
    }

    #[tokio::test]
    async fn no_credential_refreshes_to_anonymous() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let resolver = ScriptedResolver::scripted(
            vec![Step::Ready(Err(SessionError::NoCredential))],
            None,
        );
        let provider = provider_with(store, resolver, RecordingNavigator::new());

        provider.refresh().await;
        assert_eq!(provider.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn start_runs_the_initial_refresh() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.set(Credential::new("token"));
        let resolver = ScriptedResolver::with_fallback(Ok(manager()));

        let provider = SessionProvider::start(
            store,
            resolver,
            RecordingNavigator::new(),
            quiet_config(),
        )
        .await;
        assert_eq!(provider.current(), SessionState::Authenticated(manager()));
    }

    #[tokio::test]
    async fn first_refresh_is_visible_as_loading() {
        let (release, gate) = oneshot::channel();
        let store = Arc::new(InMemoryCredentialStore::new());
        let resolver = ScriptedResolver::scripted(vec![Step::Wait(gate)], None);
        let provider = provider_with(store, resolver, RecordingNavigator::new());
        assert_eq!(provider.current(), SessionState::Uninitialized);

        let in_flight = tokio::spawn({
            let provider = provider.clone();
            async move { provider.refresh().await }
        });
        tokio::task::yield_now().await;
        assert_eq!(provider.current(), SessionState::Loading);

        release.send(Ok(manager())).expect("release refresh");
        in_flight.await.expect("refresh task");
        assert_eq!(provider.current(), SessionState::Authenticated(manager()));
    }

    #[tokio::test]
    async fn background_refresh_never_shows_loading() {
        let (release, gate) = oneshot::channel();
        let store = Arc::new(InMemoryCredentialStore::new());
        let resolver =
            ScriptedResolver::scripted(vec![Step::Ready(Ok(manager())), Step::Wait(gate)], None);
        let provider = provider_with(store, resolver, RecordingNavigator::new());

        provider.refresh().await;
        assert!(provider.current().is_authenticated());

        let in_flight = tokio::spawn({
            let provider = provider.clone();
            async move { provider.refresh().await }
        });
        tokio::task::yield_now().await;
        // The stale-but-valid view stays up while the refresh runs.
        assert_eq!(provider.current(), SessionState::Authenticated(manager()));

        release.send(Ok(manager())).expect("release refresh");
        in_flight.await.expect("refresh task");
        assert_eq!(provider.current(), SessionState::Authenticated(manager()));
    }

    #[tokio::test]
    async fn rejection_clears_the_credential() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.set(Credential::new("expired"));
        let resolver = ScriptedResolver::scripted(
            vec![Step::Ready(Err(SessionError::Rejected))],
            Some(store.clone()),
        );
        let provider = provider_with(store.clone(), resolver, RecordingNavigator::new());

        provider.refresh().await;
        assert_eq!(provider.current(), SessionState::Anonymous);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn transient_failure_preserves_an_authenticated_session() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let resolver = ScriptedResolver::scripted(
            vec![
                Step::Ready(Ok(manager())),
                Step::Ready(Err(SessionError::Transient {
                    reason: "connection reset".to_string(),
                })),
            ],
            None,
        );
        let provider = provider_with(store, resolver, RecordingNavigator::new());

        provider.refresh().await;
        provider.refresh().await;
        assert_eq!(provider.current(), SessionState::Authenticated(manager()));
    }

    #[tokio::test]
    async fn transient_failure_without_a_session_is_anonymous() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let resolver = ScriptedResolver::scripted(
            vec![Step::Ready(Err(SessionError::Transient {
                reason: "timed out".to_string(),
            }))],
            None,
        );
        let provider = provider_with(store, resolver, RecordingNavigator::new());

        provider.refresh().await;
        assert_eq!(provider.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn malformed_profile_is_handled_as_rejection() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.set(Credential::new("token"));
        let resolver = ScriptedResolver::scripted(
            vec![Step::Ready(Err(SessionError::MalformedProfile {
                reason: "unknown role: wizard".to_string(),
            }))],
            Some(store.clone()),
        );
        let provider = provider_with(store.clone(), resolver, RecordingNavigator::new());

        provider.refresh().await;
        assert_eq!(provider.current(), SessionState::Anonymous);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn logout_clears_state_and_navigates_once() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.set(Credential::new("token"));
        let resolver = ScriptedResolver::with_fallback(Ok(manager()));
        let navigator = RecordingNavigator::new();
        let provider = provider_with(store.clone(), resolver, navigator.clone());

        provider.refresh().await;
        assert!(provider.current().is_authenticated());

        provider.logout();
        assert_eq!(provider.current(), SessionState::Anonymous);
        assert!(store.get().is_none());
        assert_eq!(navigator.paths(), vec![SIGN_IN_PATH.to_string()]);
    }

    #[tokio::test]
    async fn logout_discards_an_in_flight_refresh() {
        let (release, gate) = oneshot::channel();
        let store = Arc::new(InMemoryCredentialStore::new());
        store.set(Credential::new("token"));
        let resolver = ScriptedResolver::scripted(vec![Step::Wait(gate)], None);
        let provider = provider_with(store.clone(), resolver, RecordingNavigator::new());

        let in_flight = tokio::spawn({
            let provider = provider.clone();
            async move { provider.refresh().await }
        });
        tokio::task::yield_now().await;

        provider.logout();
        release.send(Ok(manager())).expect("release refresh");
        in_flight.await.expect("refresh task");

        // The stale success must not resurrect the session.
        assert_eq!(provider.current(), SessionState::Anonymous);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn establish_stores_the_credential_and_authenticates() {
        let store = Arc::new(InMemoryCredentialStore::new());
        let resolver = ScriptedResolver::with_fallback(Ok(manager()));
        let provider = provider_with(store.clone(), resolver, RecordingNavigator::new());

        provider.establish(Credential::new("fresh-token")).await;
        assert_eq!(
            store.get().map(|c| c.as_str().to_string()),
            Some("fresh-token".to_string())
        );
        assert_eq!(provider.current(), SessionState::Authenticated(manager()));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_runs_while_authenticated_and_stops_on_logout() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.set(Credential::new("token"));
        let resolver = ScriptedResolver::with_fallback(Ok(manager()));
        let provider = provider_with(store, resolver.clone(), RecordingNavigator::new());

        provider.refresh().await;
        assert_eq!(resolver.calls(), 1);

        // Let the background task register its sleep before advancing.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        tokio::time::advance(Duration::from_secs(601)).await;
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(resolver.calls(), 2);
        assert!(provider.current().is_authenticated());

        provider.logout();
        let settled = resolver.calls();
        tokio::time::advance(Duration::from_secs(3600)).await;
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(resolver.calls(), settled);
        assert_eq!(provider.current(), SessionState::Anonymous);
    }
}
