use crate::api::{ApiClient, ApiError, ApiResult};
use crate::config::EnvConfig;
use crate::models::Session;
use crate::storage::{
    clear_session_storage, load_session_from_storage, save_session_to_storage, SESSION_KEY,
};
use crate::util::now_secs;
use leptos_dom::helpers::{set_timeout_with_handle, TimeoutHandle};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Refresh this many seconds before the access token actually expires.
pub(crate) const REFRESH_LEEWAY_SECS: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub(crate) enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

type Listener = Arc<dyn Fn(AuthEvent, Option<Session>) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    items: Vec<(u64, Listener)>,
}

/// Handle returned by [`SessionProvider::on_auth_state_change`].
pub(crate) struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut l) = listeners.lock() {
                l.items.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

/// Owns the current session and fans out auth-state changes.
///
/// Every change (initial load, sign-in, sign-out, token refresh) replaces the
/// stored value before listeners are notified, so a listener calling
/// [`SessionProvider::get_session`] sees the new value.
#[derive(Clone)]
pub(crate) struct SessionProvider {
    config: EnvConfig,
    current: Arc<Mutex<Option<Session>>>,
    listeners: Arc<Mutex<Listeners>>,
    refresh_timer: Arc<Mutex<Option<TimeoutHandle>>>,
}

impl SessionProvider {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            config,
            current: Arc::new(Mutex::new(None)),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            refresh_timer: Arc::new(Mutex::new(None)),
        }
    }

    pub fn get_session(&self) -> Option<Session> {
        self.current.lock().ok().and_then(|s| s.clone())
    }

    pub fn api_client(&self) -> ApiClient {
        ApiClient::with_session(self.config.clone(), self.get_session().as_ref())
    }

    pub fn on_auth_state_change(
        &self,
        listener: impl Fn(AuthEvent, Option<Session>) + Send + Sync + 'static,
    ) -> Subscription {
        let mut id = 0;
        if let Ok(mut l) = self.listeners.lock() {
            l.next_id += 1;
            id = l.next_id;
            l.items.push((id, Arc::new(listener)));
        }
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Replace the in-memory session and notify listeners. Does not touch storage.
    pub(crate) fn notify(&self, event: AuthEvent, session: Option<Session>) {
        if let Ok(mut current) = self.current.lock() {
            *current = session.clone();
        }

        // Snapshot so listeners may (un)subscribe without deadlocking.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .map(|l| l.items.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default();

        for listener in listeners {
            listener(event, session.clone());
        }
    }

    fn set_session(&self, event: AuthEvent, session: Option<Session>) {
        match &session {
            Some(s) => save_session_to_storage(s),
            None => clear_session_storage(),
        }
        log::info!(
            "auth event {event}: {}",
            session
                .as_ref()
                .map(|s| s.user_id().to_string())
                .unwrap_or_else(|| "no session".to_string())
        );
        self.schedule_refresh(session.as_ref());
        self.notify(event, session);
    }

    /// Resolve the session at startup: an OAuth redirect result in the URL
    /// fragment wins, then the persisted session (refreshed if stale).
    /// Failures leave the user signed out.
    pub async fn initialize(&self) {
        match self.load_initial().await {
            Ok((event, session)) => self.set_session(event, session),
            Err(e) => {
                log::warn!("could not restore session: {e}");
                self.set_session(AuthEvent::InitialSession, None);
            }
        }
    }

    async fn load_initial(&self) -> ApiResult<(AuthEvent, Option<Session>)> {
        match parse_auth_fragment(&read_location_hash()) {
            FragmentAuth::Tokens(tokens) => {
                clear_location_hash();
                let session = self.session_from_tokens(tokens).await?;
                return Ok((AuthEvent::SignedIn, Some(session)));
            }
            FragmentAuth::Error(e) => {
                clear_location_hash();
                log::warn!("sign-in was rejected by the identity provider: {e}");
            }
            FragmentAuth::Empty => {}
        }

        let Some(stored) = load_session_from_storage() else {
            return Ok((AuthEvent::InitialSession, None));
        };

        if !stored.is_expired(now_secs(), REFRESH_LEEWAY_SECS) {
            return Ok((AuthEvent::InitialSession, Some(stored)));
        }

        match stored.refresh_token.as_deref() {
            Some(token) => {
                let refreshed = ApiClient::new(self.config.clone())
                    .refresh_session(token)
                    .await?;
                Ok((AuthEvent::TokenRefreshed, Some(refreshed)))
            }
            None => Ok((AuthEvent::SignedOut, None)),
        }
    }

    async fn session_from_tokens(&self, tokens: FragmentTokens) -> ApiResult<Session> {
        let mut client = ApiClient::new(self.config.clone());
        client.set_token(tokens.access_token.clone());
        let user = client.get_user().await?;
        let expires_at = tokens
            .expires_at
            .or_else(|| tokens.expires_in.map(|secs| now_secs() + secs));

        Ok(Session {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_at,
            user,
        })
    }

    /// Sends the browser to the provider's consent screen. The session is
    /// picked up from the redirect fragment by [`SessionProvider::initialize`].
    pub fn sign_in_with_provider(&self, provider: &str, redirect_to: &str) -> ApiResult<()> {
        let url = ApiClient::new(self.config.clone()).authorize_url(provider, redirect_to);
        let window = web_sys::window().ok_or_else(|| ApiError::Config("no window".to_string()))?;
        window
            .location()
            .set_href(&url)
            .map_err(|_| ApiError::Config("could not navigate to the sign-in page".to_string()))
    }

    /// Local sign-out always succeeds; the remote revoke is best-effort.
    pub async fn sign_out(&self) {
        if let Err(e) = self.api_client().sign_out().await {
            log::warn!("remote sign-out failed: {e}");
        }
        self.set_session(AuthEvent::SignedOut, None);
    }

    pub async fn refresh_now(&self) {
        let Some(token) = self.get_session().and_then(|s| s.refresh_token) else {
            return;
        };
        match ApiClient::new(self.config.clone()).refresh_session(&token).await {
            Ok(session) => self.set_session(AuthEvent::TokenRefreshed, Some(session)),
            Err(e) => {
                log::warn!("token refresh failed: {e}");
                self.set_session(AuthEvent::SignedOut, None);
            }
        }
    }

    fn schedule_refresh(&self, session: Option<&Session>) {
        let Ok(mut timer) = self.refresh_timer.lock() else {
            return;
        };
        if let Some(handle) = timer.take() {
            handle.clear();
        }

        let Some(delay) = session.and_then(|s| refresh_delay(s, now_secs())) else {
            return;
        };

        let provider = self.clone();
        let handle = set_timeout_with_handle(
            move || {
                let provider = provider.clone();
                leptos::task::spawn_local(async move { provider.refresh_now().await });
            },
            delay,
        );
        match handle {
            Ok(h) => *timer = Some(h),
            Err(_) => log::warn!("could not schedule token refresh"),
        }
    }

    /// Another tab signed in or out: mirror it here without rewriting storage.
    pub fn handle_storage_event(&self, key: Option<String>, new_value: Option<String>) {
        if key.as_deref() != Some(SESSION_KEY) {
            return;
        }
        let session = new_value.and_then(|v| serde_json::from_str::<Session>(&v).ok());
        let event = if session.is_some() {
            AuthEvent::SignedIn
        } else {
            AuthEvent::SignedOut
        };
        self.notify(event, session);
    }
}

/// Time until the access token should be refreshed, if it can be.
pub(crate) fn refresh_delay(session: &Session, now: i64) -> Option<Duration> {
    session.refresh_token.as_ref()?;
    let at = session.expires_at?;
    let secs = (at - REFRESH_LEEWAY_SECS - now).max(0);
    Some(Duration::from_secs(secs as u64))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FragmentTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub expires_at: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FragmentAuth {
    Empty,
    Tokens(FragmentTokens),
    Error(String),
}

/// Parse the `#access_token=…&refresh_token=…` redirect fragment.
pub(crate) fn parse_auth_fragment(hash: &str) -> FragmentAuth {
    let hash = hash.trim_start_matches('#');
    if hash.is_empty() {
        return FragmentAuth::Empty;
    }

    let mut pairs = std::collections::HashMap::new();
    for part in hash.split('&') {
        let (k, v) = part.split_once('=').unwrap_or((part, ""));
        let v = v.replace('+', " ");
        let v = urlencoding::decode(&v).map(|c| c.into_owned()).unwrap_or(v);
        pairs.insert(k.to_string(), v);
    }

    if let Some(err) = pairs.get("error") {
        let detail = pairs
            .get("error_description")
            .cloned()
            .unwrap_or_else(|| err.clone());
        return FragmentAuth::Error(detail);
    }

    let Some(access_token) = pairs.get("access_token").filter(|t| !t.is_empty()).cloned() else {
        return FragmentAuth::Empty;
    };

    FragmentAuth::Tokens(FragmentTokens {
        access_token,
        refresh_token: pairs.get("refresh_token").filter(|t| !t.is_empty()).cloned(),
        token_type: pairs
            .get("token_type")
            .cloned()
            .unwrap_or_else(|| "bearer".to_string()),
        expires_in: pairs.get("expires_in").and_then(|v| v.parse().ok()),
        expires_at: pairs.get("expires_at").and_then(|v| v.parse().ok()),
    })
}

fn read_location_hash() -> String {
    web_sys::window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

fn clear_location_hash() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let location = window.location();
    let path = format!(
        "{}{}",
        location.pathname().unwrap_or_default(),
        location.search().unwrap_or_default()
    );
    if let Ok(history) = window.history() {
        if let Err(e) = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&path)) {
            log::warn!("could not clear the sign-in fragment from the URL: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session(id: &str) -> Session {
        Session {
            access_token: format!("token-{id}"),
            refresh_token: Some("r".to_string()),
            token_type: "bearer".to_string(),
            expires_at: Some(10_000),
            user: User {
                id: id.to_string(),
                email: None,
                user_metadata: serde_json::Value::Null,
            },
        }
    }

    fn provider() -> SessionProvider {
        SessionProvider::new(EnvConfig::new("http://localhost:54321", "anon"))
    }

    #[test]
    fn test_notify_replaces_session_before_listeners_run() {
        let p = provider();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let p2 = p.clone();
        let seen2 = seen.clone();
        let _sub = p.on_auth_state_change(move |event, s| {
            // The provider already holds the new value.
            assert_eq!(p2.get_session(), s);
            seen2.lock().unwrap().push((event, s.map(|s| s.user.id)));
        });

        p.notify(AuthEvent::SignedIn, Some(session("u1")));
        p.notify(AuthEvent::SignedOut, None);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (AuthEvent::SignedIn, Some("u1".to_string())),
                (AuthEvent::SignedOut, None)
            ]
        );
        assert!(p.get_session().is_none());
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let p = provider();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        let sub = p.on_auth_state_change(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = calls.clone();
        let _other = p.on_auth_state_change(move |_, _| {
            c.fetch_add(10, Ordering::SeqCst);
        });

        p.notify(AuthEvent::TokenRefreshed, Some(session("u1")));
        assert_eq!(calls.load(Ordering::SeqCst), 11);

        sub.unsubscribe();
        p.notify(AuthEvent::TokenRefreshed, Some(session("u1")));
        assert_eq!(calls.load(Ordering::SeqCst), 21);
    }

    #[test]
    fn test_api_client_uses_current_token() {
        let p = provider();
        assert_eq!(p.api_client().bearer(), "Bearer anon");
        p.notify(AuthEvent::SignedIn, Some(session("u1")));
        assert_eq!(p.api_client().bearer(), "Bearer token-u1");
    }

    #[test]
    fn test_storage_event_from_other_tab() {
        let p = provider();
        let json = serde_json::to_string(&session("u2")).unwrap();

        p.handle_storage_event(Some("unrelated".to_string()), Some(json.clone()));
        assert!(p.get_session().is_none());

        p.handle_storage_event(Some(SESSION_KEY.to_string()), Some(json));
        assert_eq!(p.get_session().map(|s| s.user.id), Some("u2".to_string()));

        p.handle_storage_event(Some(SESSION_KEY.to_string()), None);
        assert!(p.get_session().is_none());
    }

    #[test]
    fn test_parse_fragment_tokens() {
        let hash = "#access_token=abc.def&expires_at=1700003600&expires_in=3600&provider_token=pt&refresh_token=r1&token_type=bearer";
        match parse_auth_fragment(hash) {
            FragmentAuth::Tokens(t) => {
                assert_eq!(t.access_token, "abc.def");
                assert_eq!(t.refresh_token.as_deref(), Some("r1"));
                assert_eq!(t.expires_in, Some(3600));
                assert_eq!(t.expires_at, Some(1_700_003_600));
                assert_eq!(t.token_type, "bearer");
            }
            other => panic!("expected tokens, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_fragment_error() {
        let hash = "#error=access_denied&error_code=403&error_description=User+denied%20access";
        assert_eq!(
            parse_auth_fragment(hash),
            FragmentAuth::Error("User denied access".to_string())
        );
    }

    #[test]
    fn test_parse_fragment_unrelated() {
        assert_eq!(parse_auth_fragment(""), FragmentAuth::Empty);
        assert_eq!(parse_auth_fragment("#section-2"), FragmentAuth::Empty);
        assert_eq!(parse_auth_fragment("#access_token="), FragmentAuth::Empty);
    }

    #[test]
    fn test_refresh_delay() {
        let s = session("u1");
        assert_eq!(refresh_delay(&s, 9_000), Some(Duration::from_secs(940)));
        // Already inside the leeway window: refresh immediately.
        assert_eq!(refresh_delay(&s, 9_990), Some(Duration::from_secs(0)));

        let no_refresh = Session {
            refresh_token: None,
            ..session("u1")
        };
        assert_eq!(refresh_delay(&no_refresh, 0), None);
    }
}
