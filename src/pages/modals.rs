use crate::api::{ApiClient, ApiResult};
use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, FieldMessage, Input, Label, Menu, MenuItem, Modal,
    ModalDescription, ModalFooter, ModalTitle, SubmitButton, Textarea,
};
use crate::forms::{FieldError, WishForm, WishFormErrors, WishlistForm};
use crate::state::collection::refresh_collection;
use crate::state::{AppContext, AppState, MutationGate};
use crate::util::absolute_link;
use leptos::ev::SubmitEvent;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::set_timeout;
use std::future::Future;
use std::time::Duration;

/// `(id, display name)` of the row a confirmation dialog acts on.
pub(crate) type DeleteTarget = Option<(String, String)>;

struct MutationMessages {
    pending: &'static str,
    success: &'static str,
    failure: &'static str,
}

const CREATE_WISHLIST: MutationMessages = MutationMessages {
    pending: "Creating wishlist...",
    success: "Wishlist created successfully.",
    failure: "Error creating wishlist.",
};

const CREATE_WISH: MutationMessages = MutationMessages {
    pending: "Creating wish...",
    success: "Wish created successfully.",
    failure: "Error creating wish.",
};

const DELETE_WISHLIST: MutationMessages = MutationMessages {
    pending: "Deleting wishlist...",
    success: "Wishlist deleted successfully.",
    failure: "Error deleting wishlist.",
};

const DELETE_WISH: MutationMessages = MutationMessages {
    pending: "Deleting wish...",
    success: "Wish deleted successfully.",
    failure: "Error deleting wish.",
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MutationOutcome {
    Succeeded,
    Failed,
    SessionExpired,
}

/// Release `gate` and apply a resolved mutation.
///
/// Success runs `on_success` then `refresh`, once each. Any failure leaves the
/// form alone. `gate` may belong to a dialog that is already gone.
pub(crate) fn settle_mutation(
    result: ApiResult<()>,
    gate: RwSignal<MutationGate>,
    on_success: impl FnOnce(),
    refresh: impl FnOnce(),
) -> MutationOutcome {
    gate.try_update(|g| g.finish());
    match result {
        Ok(()) => {
            on_success();
            refresh();
            MutationOutcome::Succeeded
        }
        Err(e) if e.is_unauthorized() => MutationOutcome::SessionExpired,
        Err(_) => MutationOutcome::Failed,
    }
}

/// Run one backend mutation behind `gate`.
///
/// The spawned task holds its own `AppState`, whose signals live as long as
/// the app, so it still finishes if the dialog unmounts first.
fn run_mutation<F, Fut>(
    app: AppState,
    gate: RwSignal<MutationGate>,
    messages: &'static MutationMessages,
    call: F,
    on_success: impl FnOnce() + 'static,
) where
    F: FnOnce(ApiClient) -> Fut,
    Fut: Future<Output = ApiResult<()>> + 'static,
{
    let mut g = gate.get_untracked();
    if !g.try_begin() {
        return;
    }
    gate.set(g);

    let toasts = app.toasts;
    let toast = toasts.loading(messages.pending);
    let fut = call(app.api_client());

    spawn_local(async move {
        let result = fut.await;
        if let Err(e) = &result {
            log::error!("{} {e}", messages.failure);
        }

        match settle_mutation(result, gate, on_success, || refresh_collection(&app)) {
            MutationOutcome::Succeeded => toasts.success(Some(toast), messages.success),
            MutationOutcome::Failed => toasts.error(Some(toast), messages.failure),
            MutationOutcome::SessionExpired => {
                toasts.error(Some(toast), messages.failure);
                app.auth.sign_out().await;
            }
        }
    });
}

/// Focus `input` once the modal content has mounted.
fn focus_on_open(open: Signal<bool>, input: NodeRef<html::Input>) {
    Effect::new(move |_| {
        if !open.get() {
            return;
        }
        set_timeout(
            move || {
                if let Some(el) = input.get_untracked() {
                    let _ = el.focus();
                }
            },
            Duration::ZERO,
        );
    });
}

#[component]
pub fn AddWishlistModal(open: RwSignal<bool>) -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let toasts = app.with_value(|a| a.toasts);

    let gate = RwSignal::new(MutationGate::default());
    let busy = Signal::derive(move || gate.get().is_in_flight());

    let name = RwSignal::new(String::new());
    let name_touched = RwSignal::new(false);
    let name_ref = NodeRef::<html::Input>::new();
    focus_on_open(open.into(), name_ref);

    let form = move || WishlistForm {
        name: name.get(),
    };
    let name_error = Signal::derive(move || {
        if !name_touched.get() {
            return None;
        }
        form().validate().map(|e| e.to_string())
    });

    let reset = move || {
        name.set(String::new());
        name_touched.set(false);
    };
    let close = move || {
        if busy.get_untracked() {
            return;
        }
        reset();
        open.set(false);
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(user_id) = app.with_value(|a| a.current_user_id()) else {
            toasts.error(None, "You are not logged in.");
            return;
        };
        let row = match untrack(form).into_new_wishlist(&user_id) {
            Ok(row) => row,
            Err(e) => {
                name_touched.set(true);
                toasts.error(None, &e.to_string());
                return;
            }
        };

        run_mutation(
            app.get_value(),
            gate,
            &CREATE_WISHLIST,
            move |api| async move { api.create_wishlist(&row).await },
            move || {
                reset();
                open.set(false);
            },
        );
    };

    view! {
        <Modal open=open on_close=move |_| close()>
            <form class="space-y-3" on:submit=on_submit>
                <ModalTitle>"Add wishlist"</ModalTitle>
                <div class="space-y-1">
                    <Label html_for="wishlist-name">"Name"</Label>
                    <Input
                        id="wishlist-name"
                        placeholder="Christmas 2023"
                        node_ref=name_ref
                        bind_value=name
                        disabled=busy
                        touched=name_touched
                        invalid=Signal::derive(move || name_error.get().is_some())
                        class="h-8 text-sm border-border bg-background"
                    />
                    <FieldMessage error=name_error />
                </div>
                <ModalFooter>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:r#type="button"
                        attr:disabled=move || busy.get()
                        on:click=move |_| close()
                    >
                        "Cancel"
                    </Button>
                    <SubmitButton loading=busy label="Create" pending_label="Creating..." />
                </ModalFooter>
            </form>
        </Modal>
    }
}

#[component]
pub fn DeleteWishlistModal(target: RwSignal<DeleteTarget>) -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let gate = RwSignal::new(MutationGate::default());
    let busy = Signal::derive(move || gate.get().is_in_flight());
    let open = Signal::derive(move || target.with(|t| t.is_some()));

    let close = move || {
        if !busy.get_untracked() {
            target.set(None);
        }
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some((id, _)) = target.get_untracked() else {
            return;
        };
        run_mutation(
            app.get_value(),
            gate,
            &DELETE_WISHLIST,
            move |api| async move { api.delete_wishlist(&id).await },
            move || target.set(None),
        );
    };

    let name = move || target.with(|t| t.as_ref().map(|(_, n)| n.clone()).unwrap_or_default());

    view! {
        <Modal open=open on_close=move |_| close()>
            <form class="space-y-3" on:submit=on_submit>
                <div>
                    <ModalTitle>"Delete wishlist"</ModalTitle>
                    <ModalDescription>
                        "Delete \"" {name} "\" and all of its wishes? This cannot be undone."
                    </ModalDescription>
                </div>
                <ModalFooter>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:r#type="button"
                        attr:disabled=move || busy.get()
                        on:click=move |_| close()
                    >
                        "Cancel"
                    </Button>
                    <SubmitButton
                        loading=busy
                        variant=ButtonVariant::Destructive
                        label="Delete"
                        pending_label="Deleting..."
                    />
                </ModalFooter>
            </form>
        </Modal>
    }
}

#[component]
pub fn AddWishModal(open: RwSignal<bool>, #[prop(into)] wishlist_id: Signal<String>) -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let toasts = app.with_value(|a| a.toasts);

    let gate = RwSignal::new(MutationGate::default());
    let busy = Signal::derive(move || gate.get().is_in_flight());

    let name = RwSignal::new(String::new());
    let description = RwSignal::new(String::new());
    let price = RwSignal::new(String::new());
    let link_url = RwSignal::new(String::new());
    let img_url = RwSignal::new(String::new());

    let name_touched = RwSignal::new(false);
    let description_touched = RwSignal::new(false);
    let price_touched = RwSignal::new(false);
    let link_touched = RwSignal::new(false);
    let img_touched = RwSignal::new(false);
    let touched_flags = [
        name_touched,
        description_touched,
        price_touched,
        link_touched,
        img_touched,
    ];

    let name_ref = NodeRef::<html::Input>::new();
    focus_on_open(open.into(), name_ref);

    let form = move || WishForm {
        name: name.get(),
        description: description.get(),
        price: price.get(),
        link_url: link_url.get(),
        img_url: img_url.get(),
    };
    let errors = Memo::new(move |_| form().validate());

    let shown = move |touched: RwSignal<bool>, pick: fn(&WishFormErrors) -> Option<FieldError>| {
        Signal::derive(move || {
            if !touched.get() {
                return None;
            }
            errors.with(|e| pick(e).map(|e| e.to_string()))
        })
    };
    let name_error = shown(name_touched, |e| e.name);
    let description_error = shown(description_touched, |e| e.description);
    let price_error = shown(price_touched, |e| e.price);
    let link_error = shown(link_touched, |e| e.link_url);
    let img_error = shown(img_touched, |e| e.img_url);

    let reset = move || {
        for field in [name, description, price, link_url, img_url] {
            field.set(String::new());
        }
        for t in touched_flags {
            t.set(false);
        }
    };
    let close = move || {
        if busy.get_untracked() {
            return;
        }
        reset();
        open.set(false);
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let row = match untrack(form).to_new_wish(&wishlist_id.get_untracked()) {
            Ok(row) => row,
            Err(e) => {
                for t in touched_flags {
                    t.set(true);
                }
                toasts.error(None, &e.to_string());
                return;
            }
        };

        run_mutation(
            app.get_value(),
            gate,
            &CREATE_WISH,
            move |api| async move { api.create_wish(&row).await },
            move || {
                reset();
                open.set(false);
            },
        );
    };

    let invalid = |error: Signal<Option<String>>| Signal::derive(move || error.get().is_some());
    let field_class = "h-8 text-sm border-border bg-background";

    view! {
        <Modal open=open on_close=move |_| close()>
            <form class="space-y-3" on:submit=on_submit>
                <ModalTitle>"Add wish"</ModalTitle>

                <div class="space-y-1">
                    <Label html_for="wish-name">"Name"</Label>
                    <Input
                        id="wish-name"
                        node_ref=name_ref
                        bind_value=name
                        disabled=busy
                        touched=name_touched
                        invalid=invalid(name_error)
                        class=field_class
                    />
                    <FieldMessage error=name_error />
                </div>

                <div class="space-y-1">
                    <Label html_for="wish-description">"Description"</Label>
                    <Textarea
                        id="wish-description"
                        bind_value=description
                        disabled=busy
                        touched=description_touched
                        invalid=invalid(description_error)
                        class="text-sm border-border bg-background"
                    />
                    <FieldMessage error=description_error />
                </div>

                <div class="space-y-1">
                    <Label html_for="wish-price">"Price (DKK)"</Label>
                    <Input
                        id="wish-price"
                        r#type="number"
                        step="0.01"
                        bind_value=price
                        disabled=busy
                        touched=price_touched
                        invalid=invalid(price_error)
                        class=field_class
                    />
                    <FieldMessage error=price_error />
                </div>

                <div class="space-y-1">
                    <Label html_for="wish-link">"Link URL"</Label>
                    <Input
                        id="wish-link"
                        placeholder="https://"
                        bind_value=link_url
                        disabled=busy
                        touched=link_touched
                        invalid=invalid(link_error)
                        class=field_class
                    />
                    <FieldMessage error=link_error />
                </div>

                <div class="space-y-1">
                    <Label html_for="wish-image">"Image URL"</Label>
                    <Input
                        id="wish-image"
                        placeholder="https://"
                        bind_value=img_url
                        disabled=busy
                        touched=img_touched
                        invalid=invalid(img_error)
                        class=field_class
                    />
                    <FieldMessage error=img_error />
                </div>

                <ModalFooter>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:r#type="button"
                        attr:disabled=move || busy.get()
                        on:click=move |_| close()
                    >
                        "Cancel"
                    </Button>
                    <SubmitButton loading=busy label="Create" pending_label="Creating..." />
                </ModalFooter>
            </form>
        </Modal>
    }
}

#[component]
pub fn DeleteWishModal(target: RwSignal<DeleteTarget>) -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let gate = RwSignal::new(MutationGate::default());
    let busy = Signal::derive(move || gate.get().is_in_flight());
    let open = Signal::derive(move || target.with(|t| t.is_some()));

    let close = move || {
        if !busy.get_untracked() {
            target.set(None);
        }
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some((id, _)) = target.get_untracked() else {
            return;
        };
        run_mutation(
            app.get_value(),
            gate,
            &DELETE_WISH,
            move |api| async move { api.delete_wish(&id).await },
            move || target.set(None),
        );
    };

    let name = move || target.with(|t| t.as_ref().map(|(_, n)| n.clone()).unwrap_or_default());

    view! {
        <Modal open=open on_close=move |_| close()>
            <form class="space-y-3" on:submit=on_submit>
                <div>
                    <ModalTitle>"Delete wish"</ModalTitle>
                    <ModalDescription>"Delete \"" {name} "\"? This cannot be undone."</ModalDescription>
                </div>
                <ModalFooter>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:r#type="button"
                        attr:disabled=move || busy.get()
                        on:click=move |_| close()
                    >
                        "Cancel"
                    </Button>
                    <SubmitButton
                        loading=busy
                        variant=ButtonVariant::Destructive
                        label="Delete"
                        pending_label="Deleting..."
                    />
                </ModalFooter>
            </form>
        </Modal>
    }
}

/// Per-card actions: open the wish's link in a new tab, or ask to delete it.
#[component]
pub fn WishOptionsMenu(
    wish_id: String,
    wish_name: String,
    link_url: String,
    delete_target: RwSignal<DeleteTarget>,
) -> impl IntoView {
    let on_open_link = Callback::new(move |_: ()| {
        let url = absolute_link(&link_url);
        if let Err(e) = window().open_with_url_and_target(&url, "_blank") {
            log::warn!("could not open {url}: {e:?}");
        }
    });
    let on_delete = Callback::new(move |_: ()| {
        delete_target.set(Some((wish_id.clone(), wish_name.clone())));
    });

    view! {
        <Menu trigger=|| view! {
            <Button variant=ButtonVariant::Ghost size=ButtonSize::Icon class="h-7 w-7" attr:aria-label="Wish options">
                <svg
                    xmlns="http://www.w3.org/2000/svg"
                    width="16"
                    height="16"
                    viewBox="0 0 24 24"
                    fill="none"
                    stroke="currentColor"
                    stroke-width="2"
                    stroke-linecap="round"
                    stroke-linejoin="round"
                    aria-hidden="true"
                >
                    <circle cx="12" cy="5" r="1" />
                    <circle cx="12" cy="12" r="1" />
                    <circle cx="12" cy="19" r="1" />
                </svg>
            </Button>
        }>
            <MenuItem on_select=on_open_link>"Open link"</MenuItem>
            <MenuItem on_select=on_delete class="text-destructive">"Delete"</MenuItem>
        </Menu>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::config::EnvConfig;
    use crate::state::collection::FetchSequence;
    use std::cell::Cell;

    fn in_flight(gate: RwSignal<MutationGate>) {
        gate.update(|g| {
            g.try_begin();
        });
    }

    #[test]
    fn test_success_closes_form_and_refreshes_once() {
        let owner = Owner::new();
        owner.with(|| {
            let gate = RwSignal::new(MutationGate::default());
            in_flight(gate);
            let closed = Cell::new(0);
            let refreshes = Cell::new(0);

            let outcome = settle_mutation(
                Ok(()),
                gate,
                || closed.set(closed.get() + 1),
                || refreshes.set(refreshes.get() + 1),
            );

            assert_eq!(outcome, MutationOutcome::Succeeded);
            assert_eq!(closed.get(), 1);
            assert_eq!(refreshes.get(), 1);
            assert!(!gate.get_untracked().is_in_flight());
        });
    }

    #[test]
    fn test_failure_keeps_form_and_skips_refresh() {
        let owner = Owner::new();
        owner.with(|| {
            for (err, expected) in [
                (
                    ApiError::Http {
                        status: 500,
                        body: "boom".to_string(),
                    },
                    MutationOutcome::Failed,
                ),
                (ApiError::Network("offline".to_string()), MutationOutcome::Failed),
                (ApiError::Unauthorized, MutationOutcome::SessionExpired),
            ] {
                let gate = RwSignal::new(MutationGate::default());
                in_flight(gate);
                let closed = Cell::new(false);
                let refreshed = Cell::new(false);

                let outcome =
                    settle_mutation(Err(err), gate, || closed.set(true), || refreshed.set(true));

                assert_eq!(outcome, expected);
                assert!(!closed.get());
                assert!(!refreshed.get());
                assert!(!gate.get_untracked().is_in_flight());
            }
        });
    }

    #[test]
    fn test_mutation_settles_after_dialog_unmounts() {
        let root = Owner::new();
        root.with(|| {
            let app = AppState::new(EnvConfig::new("https://abc.supabase.co", "anon-key"));

            let dialog = root.child();
            let gate = dialog.with(|| {
                let gate = RwSignal::new(MutationGate::default());
                in_flight(gate);
                gate
            });

            // The user navigated away while the request was pending.
            dialog.cleanup();

            let refreshes = Cell::new(0);
            let outcome = settle_mutation(Ok(()), gate, || {}, || {
                refresh_collection(&app);
                refreshes.set(refreshes.get() + 1);
            });

            assert_eq!(outcome, MutationOutcome::Succeeded);
            assert_eq!(refreshes.get(), 1);
            // Signed out, so the refresh issues no query.
            assert_eq!(app.fetch_seq.get_untracked(), FetchSequence::default());
        });
    }
}
