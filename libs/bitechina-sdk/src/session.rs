//! Session bootstrap: keeps the signed-in identity, its profile row and its
//! subscription snapshot in sync with the auth provider.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use bitechina_types::{ProfileStatus, SubscriptionSnapshot};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    api::{ProfileApi, SubscriptionApi},
    auth::{AuthEvent, AuthProvider, AuthUser, Session},
    platform::{LocalStorage, Navigator, purge_prefixed, strip_query_params},
};

/// Delay between clearing local state on sign-out and leaving the page.
pub const SIGN_OUT_REDIRECT_DELAY: Duration = Duration::from_millis(100);

const CALLBACK_PARAMS: &[&str] = &["code", "error_description"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    #[default]
    SignedOut,
    /// An auth code from the redirect is being exchanged.
    Authenticating,
    SignedIn(Session),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Entitlement {
    #[default]
    Unknown,
    Checking,
    Free,
    Trial,
    Pro,
    PastDue,
    Canceled,
}

impl Entitlement {
    pub fn from_snapshot(snapshot: &SubscriptionSnapshot) -> Self {
        if snapshot.subscribed {
            Entitlement::Pro
        } else {
            Entitlement::Free
        }
    }

    pub fn from_profile_status(status: ProfileStatus) -> Self {
        match status {
            ProfileStatus::Free => Entitlement::Free,
            ProfileStatus::Trial => Entitlement::Trial,
            ProfileStatus::Pro => Entitlement::Pro,
            ProfileStatus::PastDue => Entitlement::PastDue,
            ProfileStatus::Canceled => Entitlement::Canceled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub identity: IdentityState,
    pub entitlement: Entitlement,
    pub snapshot: SubscriptionSnapshot,
    /// True until the initial session check has finished.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: IdentityState::default(),
            entitlement: Entitlement::default(),
            snapshot: SubscriptionSnapshot::default(),
            loading: true,
        }
    }
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match &self.identity {
            IdentityState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn current_user_id(&self) -> Option<&str> {
        self.session().map(|s| s.user.id.as_str())
    }

    fn signed_out(&mut self) {
        self.identity = IdentityState::SignedOut;
        self.entitlement = Entitlement::Unknown;
        self.snapshot = SubscriptionSnapshot::unsubscribed();
        self.loading = false;
    }
}

struct Inner {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileApi>,
    subscriptions: Arc<dyn SubscriptionApi>,
    storage: Arc<dyn LocalStorage>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState>,
    /// Last identity whose profile row was ensured in this process.
    ensured_user_id: tokio::sync::Mutex<Option<String>>,
    alive: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
    redirect_delay: Duration,
}

#[derive(Clone)]
pub struct SessionBootstrapper {
    inner: Arc<Inner>,
}

impl SessionBootstrapper {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileApi>,
        subscriptions: Arc<dyn SubscriptionApi>,
        storage: Arc<dyn LocalStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                auth,
                profiles,
                subscriptions,
                storage,
                navigator,
                state,
                ensured_user_id: tokio::sync::Mutex::new(None),
                alive: AtomicBool::new(true),
                listener: Mutex::new(None),
                redirect_delay: SIGN_OUT_REDIRECT_DELAY,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// Subscribes to auth events, consumes an auth redirect if present, then
    /// restores any existing session.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        self.listen();
        self.handle_auth_callback().await;

        match self.inner.auth.current_session().await {
            Ok(Some(session)) => {
                self.apply_signed_in(session.clone());
                self.ensure_profile(&session.user).await;
                self.refresh_for(&session).await;
            }
            Ok(None) => debug!("No existing session"),
            Err(e) => warn!(error = %e, "Failed to restore session"),
        }

        self.inner.state.send_modify(|state| state.loading = false);
    }

    fn listen(&self) {
        let mut events = self.inner.auth.subscribe();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => this.on_auth_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Ok(mut listener) = self.inner.listener.lock() {
            if let Some(previous) = listener.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Applies an auth state change. Profile and subscription work runs in a
    /// spawned task; the refresh waits one scheduling tick.
    pub fn on_auth_event(&self, event: AuthEvent) {
        if !self.is_alive() {
            return;
        }
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                self.apply_signed_in(session.clone());
                let this = self.clone();
                tokio::spawn(async move {
                    this.ensure_profile(&session.user).await;
                    tokio::task::yield_now().await;
                    this.refresh_for(&session).await;
                });
            }
            AuthEvent::SignedOut => {
                self.inner.state.send_modify(SessionState::signed_out);
            }
        }
    }

    fn apply_signed_in(&self, session: Session) {
        self.inner.state.send_modify(|state| {
            let same_user = state.current_user_id() == Some(session.user.id.as_str());
            if !same_user {
                state.entitlement = Entitlement::Unknown;
                state.snapshot = SubscriptionSnapshot::unsubscribed();
            }
            state.identity = IdentityState::SignedIn(session);
        });
    }

    async fn handle_auth_callback(&self) {
        let url = self.inner.navigator.current_url();
        let mut code = None;
        let mut error_description = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "error_description" => error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(description) = &error_description {
            warn!(error = %description, "Auth redirect returned an error");
        } else if let Some(code) = &code {
            self.inner
                .state
                .send_modify(|state| state.identity = IdentityState::Authenticating);
            match self.inner.auth.exchange_code_for_session(code).await {
                Ok(session) => {
                    info!(user_id = %session.user.id, "Exchanged auth code for session");
                    self.apply_signed_in(session);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to exchange auth code");
                    self.inner
                        .state
                        .send_modify(|state| state.identity = IdentityState::SignedOut);
                }
            }
        }

        if code.is_some() || error_description.is_some() {
            let cleaned = strip_query_params(&url, CALLBACK_PARAMS);
            self.inner.navigator.replace_url(&cleaned);
        }
    }

    /// Makes sure a profile row exists for `user`, at most once per identity.
    /// Returns whether the profile is known to exist.
    pub async fn ensure_profile(&self, user: &AuthUser) -> bool {
        let Some(email) = user
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
        else {
            debug!(user_id = %user.id, "Identity has no email, skipping profile creation");
            return false;
        };

        let mut ensured = self.inner.ensured_user_id.lock().await;
        if ensured.as_deref() == Some(user.id.as_str()) {
            return true;
        }

        match self.inner.profiles.ensure_profile(&user.id, &email).await {
            Ok(profile) => {
                // A sign-out may have landed while the call was in flight.
                if self.inner.state.borrow().current_user_id() == Some(user.id.as_str()) {
                    *ensured = Some(user.id.clone());
                }
                if profile.is_new_user {
                    info!(user_id = %user.id, "Created profile");
                }
                let status = ProfileStatus::from_raw(profile.user.subscription_status.as_deref());
                self.inner.state.send_if_modified(|state| {
                    let unknown = state.entitlement == Entitlement::Unknown;
                    if unknown && state.current_user_id() == Some(user.id.as_str()) {
                        state.entitlement = Entitlement::from_profile_status(status);
                        return true;
                    }
                    false
                });
                true
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to ensure profile");
                false
            }
        }
    }

    /// Re-checks the subscription of the current identity.
    pub async fn refresh_subscription(&self) {
        let Some(session) = self.state().session().cloned() else {
            debug!("Not signed in, skipping subscription refresh");
            return;
        };
        self.refresh_for(&session).await;
    }

    /// Spawns [`Self::refresh_subscription`] after `delay`.
    pub fn refresh_after(&self, delay: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.refresh_subscription().await;
        })
    }

    async fn refresh_for(&self, session: &Session) {
        if !self.is_alive() {
            return;
        }
        let user_id = session.user.id.as_str();
        self.inner.state.send_if_modified(|state| {
            if state.current_user_id() != Some(user_id) {
                return false;
            }
            state.entitlement = Entitlement::Checking;
            true
        });

        let snapshot = match self
            .inner
            .subscriptions
            .check_subscription(&session.access_token)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(user_id, error = %e, "Subscription check failed, treating as not subscribed");
                SubscriptionSnapshot::unsubscribed()
            }
        };

        if !self.is_alive() {
            return;
        }
        let applied = self.inner.state.send_if_modified(|state| {
            if state.current_user_id() != Some(user_id) {
                return false;
            }
            state.entitlement = Entitlement::from_snapshot(&snapshot);
            state.snapshot = snapshot.clone();
            true
        });
        if !applied {
            debug!(user_id, "Identity changed during subscription check, discarding result");
        }
    }

    /// Clears local state first, then signs out upstream, purges auth storage
    /// and leaves for `/` shortly after.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        self.inner.state.send_modify(SessionState::signed_out);

        if let Err(e) = self.inner.auth.sign_out().await {
            warn!(error = %e, "Auth provider sign-out failed, clearing local state anyway");
        }

        let purged = purge_prefixed(self.inner.storage.as_ref(), self.inner.auth.storage_prefix());
        debug!(purged, "Purged auth storage");
        *self.inner.ensured_user_id.lock().await = None;

        let navigator = self.inner.navigator.clone();
        let delay = self.inner.redirect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.redirect("/");
        });
    }

    /// Stops listening; in-flight work no longer touches state.
    pub fn teardown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        if let Ok(mut listener) = self.inner.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}
