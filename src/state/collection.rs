use crate::api::{ApiClient, ApiResult};
use crate::models::{Wish, Wishlist, WishlistWithWishes};
use crate::state::{AppState, LoadState};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::HashMap;

/// Monotonic request numbering for collection refreshes.
///
/// Two refreshes may be in flight at once; whichever resolves, a response is
/// only applied if it is newer than the last one applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FetchSequence {
    issued: u64,
    applied: u64,
}

impl FetchSequence {
    pub fn issue(&mut self) -> u64 {
        self.issued = self.issued.saturating_add(1);
        self.issued
    }

    /// Treat every request issued so far as stale, e.g. after the user signs out.
    pub fn invalidate(&mut self) {
        self.applied = self.issued;
    }

    /// Marks `seq` as applied when it is newer than the last applied response.
    pub fn try_apply(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }
}

/// Join wishes onto their wishlists.
///
/// Wishlist order and per-wishlist wish order follow the backend. Wishes whose
/// wishlist is not in `wishlists` are dropped.
pub(crate) fn assemble_collection(
    wishlists: Vec<Wishlist>,
    wishes: Vec<Wish>,
) -> Vec<WishlistWithWishes> {
    let mut by_list: HashMap<String, Vec<Wish>> = HashMap::with_capacity(wishlists.len());
    for w in wishes {
        by_list.entry(w.wishlist_id.clone()).or_default().push(w);
    }

    wishlists
        .into_iter()
        .map(|wishlist| {
            let wishes = by_list.remove(&wishlist.id).unwrap_or_default();
            WishlistWithWishes { wishlist, wishes }
        })
        .collect()
}

/// One query for the user's wishlists, then one batched query for their wishes.
pub(crate) async fn fetch_collection(
    api: &ApiClient,
    user_id: &str,
) -> ApiResult<Vec<WishlistWithWishes>> {
    let wishlists = api.list_wishlists(user_id).await?;
    let ids: Vec<String> = wishlists.iter().map(|w| w.id.clone()).collect();
    let wishes = api.list_wishes_for(&ids).await?;
    Ok(assemble_collection(wishlists, wishes))
}

/// Re-fetch the current user's collection into `app.wishlists`.
///
/// Without a session nothing is queried. Data already on screen stays visible
/// until the new result lands.
pub(crate) fn refresh_collection(app: &AppState) {
    let Some(user_id) = app.current_user_id() else {
        return;
    };

    let mut seq_state = app.fetch_seq.get_untracked();
    let seq = seq_state.issue();
    app.fetch_seq.set(seq_state);

    let api = app.api_client();
    let app = app.clone();
    spawn_local(async move {
        let result = fetch_collection(&api, &user_id).await;

        let mut seq_state = app.fetch_seq.get_untracked();
        if !seq_state.try_apply(seq) {
            log::debug!("dropping stale collection response #{seq}");
            return;
        }
        app.fetch_seq.set(seq_state);

        match result {
            Ok(collection) => {
                log::info!("loaded {} wishlists", collection.len());
                app.wishlists.set(LoadState::Ready(collection));
            }
            Err(e) if e.is_unauthorized() => {
                log::warn!("session rejected while fetching wishlists; signing out");
                app.auth.sign_out().await;
            }
            Err(e) => {
                log::error!("Error fetching wishlists: {e}");
                app.wishlists.set(LoadState::Failed(e.to_string()));
            }
        }
    });
}

/// Drop the collection on sign-out. Responses still in flight for the previous
/// user are discarded when they land.
pub(crate) fn clear_collection(app: &AppState) {
    app.fetch_seq.update(|s| s.invalidate());
    app.wishlists.set(LoadState::Loading);
}
