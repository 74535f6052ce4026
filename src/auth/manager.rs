//! Session lifecycle management.
//!
//! `SessionManager` owns the authentication state for the running
//! client: the access/refresh pair, the authenticated identity and
//! profile, and the background refresh timer. It is the only writer of
//! the persisted credential store.
//!
//! Failure policy: every network failure is caught here. Login and
//! registration failures surface a single human-readable message via
//! `last_error`; refresh and startup failures clear all state silently.
//! Nothing is retried except the one initialize -> refresh -> retry
//! chain at startup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{Identity, Profile, ProfileTextUpdate};

use super::session::Session;
use super::store::CredentialStore;

/// Background refresh cadence while authenticated.
/// 4 minutes keeps a 4-hour access token perpetually fresh with a wide
/// safety margin.
const REFRESH_INTERVAL_SECS: u64 = 240;

/// Shown when a login failure carries no server-provided message.
const LOGIN_FALLBACK_ERROR: &str = "An error occurred during login";

/// Shown when a registration failure carries no server-provided message.
const REGISTER_FALLBACK_ERROR: &str = "An error occurred during registration";

/// Owns session state and drives the token lifecycle against the
/// Account API. Clone is cheap - all state is Arc-shared, so clones
/// observe the same session.
#[derive(Clone)]
pub struct SessionManager {
    session: Arc<RwLock<Session>>,
    client: ApiClient,
    store: CredentialStore,
    refresh_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionManager {
    pub fn new(client: ApiClient, store: CredentialStore) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::new())),
            client,
            store,
            refresh_task: Arc::new(Mutex::new(None)),
        }
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Restore a previous session from the persisted credential store.
    ///
    /// Strictly sequential: load identity, maybe refresh, maybe retry.
    /// The session is settled (authenticated or fully cleared) by the
    /// time this returns. With no usable credentials no network call is
    /// made at all.
    pub async fn initialize(&self) -> Result<()> {
        let stored = self.store.load()?;

        let access = match (stored.access, stored.refresh) {
            (None, None) => {
                debug!("No stored credentials, starting unauthenticated");
                return Ok(());
            }
            (None, Some(_)) => {
                // A refresh token without an access token is a stale
                // artifact; a refresh attempt with it is known-doomed,
                // so it is discarded without a network call.
                debug!("Discarding stray refresh token");
                self.store.clear()?;
                return Ok(());
            }
            (Some(access), refresh) => {
                let mut session = self.session.write().await;
                session.access_token = Some(access.clone());
                session.refresh_token = refresh;
                access
            }
        };

        let generation = self.session.read().await.generation();
        if self.load_identity(&access, generation).await {
            info!("Session restored from stored access token");
            self.start_refresh_timer().await;
            return Ok(());
        }

        // Access token rejected; one refresh-then-retry if possible.
        let has_refresh = self.session.read().await.refresh_token.is_some();
        if has_refresh {
            if let Some(new_access) = self.refresh().await? {
                let generation = self.session.read().await.generation();
                if self.load_identity(&new_access, generation).await {
                    info!("Session restored after token refresh");
                    self.start_refresh_timer().await;
                    return Ok(());
                }
            }
        }

        debug!("Stored credentials unusable, clearing session");
        self.clear_all().await?;
        Ok(())
    }

    // =========================================================================
    // User-triggered operations
    // =========================================================================

    /// Exchange username/password for a token pair. Returns true when
    /// the session ends up authenticated; on failure the server message
    /// is available via `take_last_error`.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        self.session.write().await.last_error = None;

        let pair = match self.client.obtain_token(username, password).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Login failed");
                let message = e
                    .downcast_ref::<ApiError>()
                    .and_then(|api| api.user_message())
                    .map(str::to_string)
                    .unwrap_or_else(|| LOGIN_FALLBACK_ERROR.to_string());
                self.session.write().await.last_error = Some(message);
                return Ok(false);
            }
        };

        self.store.store_pair(&pair.access, &pair.refresh)?;

        let generation = {
            let mut session = self.session.write().await;
            session.access_token = Some(pair.access.clone());
            session.refresh_token = Some(pair.refresh.clone());
            session.generation()
        };

        if self.load_identity(&pair.access, generation).await {
            info!("Login successful");
            self.start_refresh_timer().await;
            Ok(true)
        } else {
            // Token was issued but the identity endpoint rejected it;
            // leave the session unauthenticated.
            warn!("Login obtained tokens but identity load failed");
            Ok(false)
        }
    }

    /// Register a new account. Returns true on success (callers then
    /// direct the user to login); on failure the server's validation
    /// message is available via `take_last_error`.
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<bool> {
        self.session.write().await.last_error = None;

        match self
            .client
            .register(first_name, last_name, email, password)
            .await
        {
            Ok(message) => {
                info!(message = %message, "Registration successful");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                let message = e
                    .downcast_ref::<ApiError>()
                    .and_then(|api| api.user_message())
                    .map(str::to_string)
                    .unwrap_or_else(|| REGISTER_FALLBACK_ERROR.to_string());
                self.session.write().await.last_error = Some(message);
                Ok(false)
            }
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Runs on an unattended timer, so failure is silent: the whole
    /// session is cleared and no error is surfaced. Returns the new
    /// access token, or None when there was nothing to refresh, the
    /// refresh was rejected, or the session was invalidated while the
    /// request was in flight.
    pub async fn refresh(&self) -> Result<Option<String>> {
        let stored = self.store.load()?;
        let Some(refresh) = stored.refresh else {
            return Ok(None);
        };

        let generation = self.session.read().await.generation();

        match self.client.refresh_token(&refresh).await {
            Ok(access) => {
                let mut session = self.session.write().await;
                if !session.is_current(generation) {
                    debug!("Discarding refresh result, session was invalidated");
                    return Ok(None);
                }
                session.access_token = Some(access.clone());
                // Persist while still holding the lock: a concurrent
                // logout serializes behind this guard, so its clear of
                // the store always lands after this write.
                self.store.store_access(&access)?;
                drop(session);
                debug!("Access token refreshed");
                Ok(Some(access))
            }
            Err(e) => {
                debug!(error = %e, "Token refresh failed, clearing session");
                let mut session = self.session.write().await;
                if session.is_current(generation) {
                    session.clear();
                    self.store.clear()?;
                }
                Ok(None)
            }
        }
    }

    /// Log out. All in-memory and persisted state is cleared before
    /// this returns; the server-side invalidation of the refresh token
    /// happens on a detached task and its failure is only logged.
    pub async fn logout(&self) {
        // Capture the refresh token before the clear wipes both layers.
        let refresh = {
            let session = self.session.read().await;
            session.refresh_token.clone()
        };
        let refresh = match refresh {
            Some(r) => Some(r),
            None => self.store.load().ok().and_then(|pair| pair.refresh),
        };

        self.session.write().await.clear();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential store");
        }
        self.stop_refresh_timer().await;
        info!("Logged out");

        if let Some(refresh) = refresh {
            let client = self.client.clone();
            tokio::spawn(async move {
                if let Err(e) = client.logout(&refresh).await {
                    warn!(error = %e, "Background logout notification failed");
                }
            });
        }
    }

    // =========================================================================
    // Profile operations
    // =========================================================================

    /// Update profile text fields and replace the cached profile.
    pub async fn update_profile_text(&self, update: &ProfileTextUpdate) -> Result<Profile> {
        let access = self.require_access().await?;
        let generation = self.session.read().await.generation();

        let profile = self.client.update_profile_text(&access, update).await?;
        self.apply_profile(profile.clone(), generation).await;
        Ok(profile)
    }

    /// Upload a new avatar and replace the cached profile.
    pub async fn update_profile_avatar(&self, filename: &str, bytes: Vec<u8>) -> Result<Profile> {
        let access = self.require_access().await?;
        let generation = self.session.read().await.generation();

        let profile = self
            .client
            .update_profile_avatar(&access, filename, bytes)
            .await?;
        self.apply_profile(profile.clone(), generation).await;
        Ok(profile)
    }

    /// Request a password reset email. Returns the server message.
    pub async fn request_password_reset(&self, email: &str) -> Result<String> {
        self.client.request_password_reset(email).await
    }

    /// Confirm a password reset with the emailed token.
    pub async fn confirm_password_reset(&self, token: &str, password: &str) -> Result<String> {
        self.client.confirm_password_reset(token, password).await
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.authenticated
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.session.read().await.identity.clone()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.session.read().await.profile.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session.read().await.access_token.clone()
    }

    /// Surface-once error from the last login/register attempt.
    pub async fn take_last_error(&self) -> Option<String> {
        self.session.write().await.take_last_error()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Load identity (and best-effort profile) with the given access
    /// token. Returns true when the identity was applied. API failures
    /// are swallowed and logged; results captured under an older
    /// generation are discarded.
    async fn load_identity(&self, access: &str, generation: u64) -> bool {
        let identity = match self.client.fetch_current_user(access).await {
            Ok(identity) => identity,
            Err(e) => {
                debug!(error = %e, "Identity load failed");
                return false;
            }
        };

        {
            let mut session = self.session.write().await;
            if !session.is_current(generation) {
                debug!("Discarding identity, session was invalidated");
                return false;
            }
            session.set_identity(identity);
        }

        // Profile is display data; its failure never blocks auth.
        match self.client.fetch_profile(access).await {
            Ok(profile) => self.apply_profile(profile, generation).await,
            Err(e) => debug!(error = %e, "Profile load failed"),
        }

        true
    }

    async fn apply_profile(&self, profile: Profile, generation: u64) {
        let mut session = self.session.write().await;
        if session.is_current(generation) {
            session.profile = Some(profile);
        }
    }

    async fn require_access(&self) -> Result<String> {
        if let Some(access) = self.session.read().await.access_token.clone() {
            return Ok(access);
        }
        self.store
            .load()?
            .access
            .context("No access token available")
    }

    async fn clear_all(&self) -> Result<()> {
        self.session.write().await.clear();
        self.store.clear()?;
        self.stop_refresh_timer().await;
        Ok(())
    }

    /// Start (or restart) the periodic refresh task. While the session
    /// stays authenticated it refreshes the access token and reloads
    /// the identity every tick; it exits as soon as the session is no
    /// longer authenticated.
    async fn start_refresh_timer(&self) {
        let mut guard = self.refresh_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let manager = self.clone();
        *guard = Some(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(REFRESH_INTERVAL_SECS));
            // The first tick completes immediately; consume it so the
            // first refresh happens a full interval after login.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !manager.is_authenticated().await {
                    break;
                }
                match manager.refresh().await {
                    Ok(Some(access)) => {
                        let generation = manager.session.read().await.generation();
                        manager.load_identity(&access, generation).await;
                    }
                    // Refresh was rejected and cleared the session, or
                    // there was nothing left to refresh.
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Background refresh error");
                    }
                }
            }
        }));
    }

    /// Stop the periodic refresh task deterministically.
    async fn stop_refresh_timer(&self) {
        if let Some(handle) = self.refresh_task.lock().await.take() {
            handle.abort();
        }
    }
}
