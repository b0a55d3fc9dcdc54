//! Session state
//!
//! The session is read from durable storage once at startup. Until that read has
//! happened `initialized` is false and route guards must not decide anything.
//! Login and registration persist the token and user; logout wipes both along
//! with every cached query result of the previous session.

use std::sync::Arc;

use dioxus::prelude::*;

use crate::{
    api::{AuthApi, AuthResponse, Credentials, RegisterPayload, entities::User},
    errors::ClientResult,
    global::get_global_runtime,
    http::{SessionToken, TokenSource},
    storage::{Storage, TOKEN_KEY, USER_KEY},
};

/// Who is signed in
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    /// True once durable storage has been read
    pub initialized: bool,
}

impl SessionState {
    fn signed_in(response: AuthResponse) -> Self {
        Self {
            user: Some(response.user),
            token: Some(response.token),
            initialized: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            initialized: true,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Session operations, independent of the UI framework
#[derive(Clone)]
pub struct AuthService {
    api: AuthApi,
    storage: Arc<dyn Storage>,
    token: SessionToken,
}

impl AuthService {
    /// `token` must be the same handle the HTTP client reads its bearer token from
    pub fn new(api: AuthApi, storage: Arc<dyn Storage>, token: SessionToken) -> Self {
        Self {
            api,
            storage,
            token,
        }
    }

    pub fn session_token(&self) -> &SessionToken {
        &self.token
    }

    /// Restores the persisted session. Synchronous; an unreadable or partial
    /// session is treated as signed out.
    pub fn rehydrate(&self) -> SessionState {
        match self.read_persisted() {
            Ok(Some((token, user))) => {
                crate::debug_log!("🔑 [AUTH] Restored session for user {}", user.id);
                self.token.set_token(token.clone());
                SessionState {
                    user: Some(user),
                    token: Some(token),
                    initialized: true,
                }
            }
            Ok(None) => {
                self.token.clear_token();
                SessionState::signed_out()
            }
            Err(e) => {
                crate::warn_log!("⚠️ [AUTH] Ignoring unreadable session: {}", e);
                self.token.clear_token();
                SessionState::signed_out()
            }
        }
    }

    fn read_persisted(&self) -> ClientResult<Option<(String, User)>> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;
        match (token, user) {
            (Some(token), Some(user)) => Ok(Some((token, serde_json::from_str(&user)?))),
            _ => Ok(None),
        }
    }

    fn persist(&self, response: &AuthResponse) -> ClientResult<()> {
        self.storage.set(TOKEN_KEY, &response.token)?;
        self.storage
            .set(USER_KEY, &serde_json::to_string(&response.user)?)?;
        self.token.set_token(response.token.clone());
        Ok(())
    }

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<SessionState> {
        let response = self.api.login(credentials).await?;
        self.persist(&response)?;
        crate::debug_log!("🔑 [AUTH] Signed in as {}", response.user.id);
        Ok(SessionState::signed_in(response))
    }

    pub async fn register(&self, payload: &RegisterPayload) -> ClientResult<SessionState> {
        let response = self.api.register(payload).await?;
        self.persist(&response)?;
        crate::debug_log!("🔑 [AUTH] Registered {}", response.user.id);
        Ok(SessionState::signed_in(response))
    }

    /// Clears the token and user everywhere. Synchronous.
    pub fn logout(&self) -> SessionState {
        self.token.clear_token();
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                crate::warn_log!("⚠️ [AUTH] Failed to remove '{}' from storage: {}", key, e);
            }
        }
        if let Ok(runtime) = get_global_runtime() {
            runtime.clear();
        }
        SessionState::signed_out()
    }

    /// Whether requests currently carry a bearer token
    pub fn has_token(&self) -> bool {
        self.token.token().is_some()
    }
}

/// The session as seen by components
#[derive(Clone)]
pub struct AuthContext {
    session: Signal<SessionState>,
    service: AuthService,
}

impl AuthContext {
    pub fn session(&self) -> SessionState {
        self.session.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_authenticated()
    }

    /// Whether storage has been read; guards must wait for this
    pub fn is_ready(&self) -> bool {
        self.session.read().initialized
    }

    /// Signs in and publishes the new session; on failure the session is untouched
    pub async fn login(&self, credentials: Credentials) -> ClientResult<SessionState> {
        let state = self.service.login(&credentials).await?;
        self.apply(state.clone());
        Ok(state)
    }

    pub async fn register(&self, payload: RegisterPayload) -> ClientResult<SessionState> {
        let state = self.service.register(&payload).await?;
        self.apply(state.clone());
        Ok(state)
    }

    pub fn logout(&self) {
        self.apply(self.service.logout());
    }

    fn apply(&self, state: SessionState) {
        let mut session = self.session;
        session.set(state);
    }
}

/// Install the session for the component tree
///
/// Storage is read synchronously while the context is created, so `is_ready()`
/// is already true when the first child renders.
pub fn use_auth_provider(service: AuthService) -> AuthContext {
    use_context_provider(move || {
        let state = service.rehydrate();
        AuthContext {
            session: Signal::new(state),
            service,
        }
    })
}

/// The session installed by [`use_auth_provider`]
pub fn use_auth() -> AuthContext {
    use_context()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ClientConfig, http::HttpClient, storage::MemoryStorage};

    fn service(storage: MemoryStorage) -> AuthService {
        let api = AuthApi::new(HttpClient::new(ClientConfig::default()).unwrap());
        AuthService::new(api, Arc::new(storage), SessionToken::new())
    }

    #[test]
    fn empty_storage_rehydrates_signed_out() {
        let state = service(MemoryStorage::new()).rehydrate();
        assert!(state.initialized);
        assert_eq!(state.user, None);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn partial_or_corrupt_session_is_ignored() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        let auth = service(storage.clone());
        assert!(!auth.rehydrate().is_authenticated());
        assert!(!auth.has_token());

        storage.set(USER_KEY, "{not json").unwrap();
        assert!(!auth.rehydrate().is_authenticated());
    }

    #[test]
    fn logout_wipes_storage_and_token() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage.set(USER_KEY, r#"{"id":3,"name":"Lin"}"#).unwrap();
        let auth = service(storage.clone());

        let restored = auth.rehydrate();
        assert_eq!(restored.user.as_ref().map(|u| u.id.to_string()), Some("3".into()));
        assert!(auth.has_token());

        let state = auth.logout();
        assert!(state.initialized);
        assert!(!state.is_authenticated());
        assert!(!auth.has_token());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }
}
