use crate::config::EnvConfig;
use crate::pages::{DashboardPage, Layout, NotFoundPage, SettingsPage, WishlistPage};
use crate::state::collection::{clear_collection, refresh_collection};
use crate::state::{AppContext, AppState};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let app = AppState::new(EnvConfig::load());
    provide_context(AppContext(app.clone()));

    // Mirror the provider into signals so views re-render on auth changes.
    let session = app.session;
    let auth_ready = app.auth_ready;
    let subscription = app.auth.on_auth_state_change(move |_event, s| {
        session.set(s);
        auth_ready.set(true);
    });

    let auth = app.auth.clone();
    spawn_local(async move { auth.initialize().await });

    let auth = app.auth.clone();
    let storage_handle = window_event_listener(ev::storage, move |e: web_sys::StorageEvent| {
        auth.handle_storage_event(e.key(), e.new_value());
    });

    on_cleanup(move || {
        subscription.unsubscribe();
        storage_handle.remove();
    });

    // Token refreshes keep the same user, so only a user change refetches.
    let user_id = Memo::new(move |_| session.with(|s| s.as_ref().map(|s| s.user_id().to_string())));
    let app_for_effect = app.clone();
    Effect::new(move |_| match user_id.get() {
        Some(_) => refresh_collection(&app_for_effect),
        None => clear_collection(&app_for_effect),
    });

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! {
                <Layout>
                    <NotFoundPage />
                </Layout>
            }>
                <Route path=path!("") view=move || view! {
                    <Layout>
                        <DashboardPage />
                    </Layout>
                } />
                <Route path=path!("settings") view=move || view! {
                    <Layout>
                        <SettingsPage />
                    </Layout>
                } />
                <Route path=path!("wishlist/:id") view=move || view! {
                    <Layout>
                        <WishlistPage />
                    </Layout>
                } />
            </Routes>
        </Router>
    }
}
