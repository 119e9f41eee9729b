pub(crate) mod collection;
pub(crate) mod toasts;

use crate::api::ApiClient;
use crate::auth::SessionProvider;
use crate::config::EnvConfig;
use crate::models::{Session, WishlistWithWishes};
use collection::FetchSequence;
use leptos::prelude::*;
use toasts::Notifier;

/// Result of a remote load, consumed uniformly by every data route.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn map_ref<U>(&self, f: impl FnOnce(&T) -> U) -> LoadState<U> {
        match self {
            LoadState::Loading => LoadState::Loading,
            LoadState::Ready(v) => LoadState::Ready(f(v)),
            LoadState::Failed(e) => LoadState::Failed(e.clone()),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub auth: SessionProvider,

    /// Mirrors `auth` so views can track it reactively.
    pub session: RwSignal<Option<Session>>,

    /// False until the provider has resolved the startup session.
    pub auth_ready: RwSignal<bool>,

    pub wishlists: RwSignal<LoadState<Vec<WishlistWithWishes>>>,

    /// Fetch guard (ignore stale responses).
    pub fetch_seq: RwSignal<FetchSequence>,

    pub toasts: Notifier,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            auth: SessionProvider::new(config),
            session: RwSignal::new(None),
            auth_ready: RwSignal::new(false),
            wishlists: RwSignal::new(LoadState::Loading),
            fetch_seq: RwSignal::new(FetchSequence::default()),
            toasts: Notifier::new(),
        }
    }

    pub fn api_client(&self) -> ApiClient {
        self.auth.api_client()
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.session
            .get_untracked()
            .map(|s| s.user_id().to_string())
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

/// In-flight flag for a form: a second submit while one is pending is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct MutationGate {
    in_flight: bool,
}

impl MutationGate {
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_state_map_ref() {
        let s: LoadState<Vec<u32>> = LoadState::Ready(vec![1, 2]);
        assert_eq!(s.map_ref(|v| v.len()), LoadState::Ready(2));

        let f: LoadState<u32> = LoadState::Failed("boom".to_string());
        assert_eq!(f.map_ref(|v| *v + 1), LoadState::Failed("boom".to_string()));
        assert_eq!(LoadState::<u32>::Loading.map_ref(|v| *v), LoadState::Loading);
    }

    #[test]
    fn test_mutation_gate_blocks_double_submit() {
        let mut gate = MutationGate::default();
        assert!(gate.try_begin());
        assert!(gate.is_in_flight());
        assert!(!gate.try_begin());

        gate.finish();
        assert!(!gate.is_in_flight());
        assert!(gate.try_begin());
    }
}
