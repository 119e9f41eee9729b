pub(crate) mod modals;

use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardFooter, CardGrid, CardTitle, ErrorAlert, LoadingBlock,
};
use crate::components::{Navbar, Toaster};
use crate::models::{Wish, WishlistWithWishes};
use crate::state::{AppContext, LoadState};
use crate::util::{display_host, format_average_price, format_created_at, format_dkk};
use chrono::{Local, TimeZone};
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use leptos_router::params::Params;
use modals::{
    AddWishModal, AddWishlistModal, DeleteTarget, DeleteWishModal, DeleteWishlistModal,
    WishOptionsMenu,
};

/// One dashboard table row, already formatted for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DashboardRow {
    pub number: usize,
    pub id: String,
    pub name: String,
    pub wish_count: usize,
    pub average_price: String,
    pub created_at: String,
}

pub(crate) fn dashboard_rows<Tz: TimeZone>(lists: &[WishlistWithWishes], tz: &Tz) -> Vec<DashboardRow> {
    lists
        .iter()
        .enumerate()
        .map(|(i, w)| DashboardRow {
            number: i + 1,
            id: w.wishlist.id.clone(),
            name: w.wishlist.name.clone(),
            wish_count: w.wishes.len(),
            average_price: format_average_price(w.average_price()),
            created_at: format_created_at(&w.wishlist.created_at.with_timezone(tz)),
        })
        .collect()
}

/// Look a wishlist up in the already-fetched collection.
pub(crate) fn find_wishlist(
    state: &LoadState<Vec<WishlistWithWishes>>,
    id: &str,
) -> LoadState<Option<WishlistWithWishes>> {
    state.map_ref(|lists| lists.iter().find(|w| w.wishlist.id == id).cloned())
}

#[component]
pub fn Layout(children: ChildrenFn) -> impl IntoView {
    let children = StoredValue::new(children);

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <Navbar />
            <main class="mx-auto max-w-5xl px-4 py-6">
                {move || children.with_value(|c| c())}
            </main>
            <Toaster />
        </div>
    }
}

/// Renders `children` only with a session; otherwise the logged-out notice.
#[component]
pub fn RequireSession(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let session = app_state.0.session;
    let auth_ready = app_state.0.auth_ready;

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show
            when=move || auth_ready.get()
            fallback=|| view! { <LoadingBlock message="Checking session..." /> }
        >
            <Show
                when=move || session.with(|s| s.is_some())
                fallback=|| view! {
                    <div class="py-8 text-sm text-muted-foreground">"You are not logged in."</div>
                }
            >
                {move || children.with_value(|c| c())}
            </Show>
        </Show>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    view! {
        <RequireSession>
            <WishlistTable />
        </RequireSession>
    }
}

#[component]
fn WishlistTable() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let wishlists = app_state.0.wishlists;
    let navigate = StoredValue::new(use_navigate());

    let create_open = RwSignal::new(false);
    let delete_target: RwSignal<DeleteTarget> = RwSignal::new(None);

    let rows = move || {
        wishlists.with(|s| s.map_ref(|lists| dashboard_rows(lists, &Local)))
    };

    view! {
        <div class="flex items-center justify-between">
            <h1 class="text-lg font-semibold">"Your wishlists"</h1>
            <Button size=ButtonSize::Sm on:click=move |_| create_open.set(true)>
                "Add wishlist"
            </Button>
        </div>

        {move || match rows() {
            LoadState::Loading => view! { <LoadingBlock message="Loading wishlists..." /> }.into_any(),
            LoadState::Failed(e) => view! {
                <div class="mt-4">
                    <ErrorAlert title="Could not load wishlists" message=e />
                </div>
            }
            .into_any(),
            LoadState::Ready(rows) if rows.is_empty() => view! {
                <div class="mt-6 text-sm text-muted-foreground">
                    "No wishlists yet. Add one to get started."
                </div>
            }
            .into_any(),
            LoadState::Ready(rows) => view! {
                <div class="mt-4 overflow-x-auto rounded-md border">
                    <table class="w-full text-sm">
                        <thead class="bg-muted/50 text-left text-xs text-muted-foreground">
                            <tr>
                                <th class="px-3 py-2">"#"</th>
                                <th class="px-3 py-2">"Name"</th>
                                <th class="px-3 py-2">"# of wishes"</th>
                                <th class="px-3 py-2">"Avg. price"</th>
                                <th class="px-3 py-2">"Created at"</th>
                                <th class="px-3 py-2 text-right">"Actions"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {rows
                                .into_iter()
                                .map(|row| {
                                    let href = format!("/wishlist/{}", row.id);
                                    let target = (row.id.clone(), row.name.clone());
                                    view! {
                                        <tr class="border-t">
                                            <td class="px-3 py-2 text-muted-foreground">{row.number}</td>
                                            <td class="px-3 py-2 font-medium">{row.name}</td>
                                            <td class="px-3 py-2">{row.wish_count}</td>
                                            <td class="px-3 py-2">{row.average_price}</td>
                                            <td class="px-3 py-2">{row.created_at}</td>
                                            <td class="px-3 py-2">
                                                <div class="flex justify-end gap-2">
                                                    <Button
                                                        variant=ButtonVariant::Outline
                                                        size=ButtonSize::Sm
                                                        on:click=move |_| {
                                                            navigate.with_value(|nav| nav(&href, Default::default()));
                                                        }
                                                    >
                                                        "Select"
                                                    </Button>
                                                    <Button
                                                        variant=ButtonVariant::Destructive
                                                        size=ButtonSize::Sm
                                                        on:click=move |_| delete_target.set(Some(target.clone()))
                                                    >
                                                        "Delete"
                                                    </Button>
                                                </div>
                                            </td>
                                        </tr>
                                    }
                                })
                                .collect_view()}
                        </tbody>
                    </table>
                </div>
            }
            .into_any(),
        }}

        <AddWishlistModal open=create_open />
        <DeleteWishlistModal target=delete_target />
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct WishlistRouteParams {
    pub id: Option<String>,
}

#[component]
pub fn WishlistPage() -> impl IntoView {
    view! {
        <RequireSession>
            <WishlistDetail />
        </RequireSession>
    }
}

#[component]
fn WishlistDetail() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let wishlists = app_state.0.wishlists;
    let params = leptos_router::hooks::use_params::<WishlistRouteParams>();

    // Use closures so params access happens inside a reactive tracking context.
    let wishlist_id = Signal::derive(move || params.get().ok().and_then(|p| p.id).unwrap_or_default());

    let create_open = RwSignal::new(false);
    let delete_target: RwSignal<DeleteTarget> = RwSignal::new(None);

    let resolved = Memo::new(move |_| {
        let id = wishlist_id.get();
        wishlists.with(|s| find_wishlist(s, &id))
    });

    view! {
        {move || match resolved.get() {
            LoadState::Loading => view! { <LoadingBlock message="Loading wishlist..." /> }.into_any(),
            LoadState::Failed(e) => view! { <ErrorAlert title="Could not load wishlist" message=e /> }.into_any(),
            LoadState::Ready(None) => view! {
                <div class="py-8 text-sm text-muted-foreground">"Wishlist not found"</div>
            }
            .into_any(),
            LoadState::Ready(Some(w)) => {
                let title = w.wishlist.name.clone();
                let summary = format!(
                    "{} wishes, average {}",
                    w.wishes.len(),
                    format_average_price(w.average_price())
                );
                let cards = if w.wishes.is_empty() {
                    view! { <div class="mt-6 text-sm text-muted-foreground">"No wishes yet."</div> }.into_any()
                } else {
                    view! {
                        <CardGrid>
                            {w.wishes
                                .into_iter()
                                .map(|wish| view! { <WishCard wish=wish delete_target=delete_target /> })
                                .collect_view()}
                        </CardGrid>
                    }
                    .into_any()
                };

                view! {
                    <div class="flex items-center justify-between">
                        <div>
                            <h1 class="text-lg font-semibold">{title}</h1>
                            <p class="text-xs text-muted-foreground">{summary}</p>
                        </div>
                        <Button size=ButtonSize::Sm on:click=move |_| create_open.set(true)>
                            "Add wish"
                        </Button>
                    </div>
                    {cards}
                }
                .into_any()
            }
        }}

        <AddWishModal open=create_open wishlist_id=wishlist_id />
        <DeleteWishModal target=delete_target />
    }
}

#[component]
fn WishCard(wish: Wish, delete_target: RwSignal<DeleteTarget>) -> impl IntoView {
    let Wish {
        id,
        name,
        description,
        price,
        img_url,
        link_url,
        ..
    } = wish;
    let host = display_host(&link_url);
    let price = format_dkk(price);
    let alt = name.clone();
    let title = name.clone();
    let link_title = link_url.clone();

    view! {
        <Card>
            <img src=img_url alt=alt class="h-48 w-full bg-muted object-cover" loading="lazy" />
            <CardContent>
                <CardTitle>{title}</CardTitle>
                <CardDescription>{description}</CardDescription>
            </CardContent>
            <CardFooter>
                <span class="truncate" title=link_title>{host}</span>
                <span class="font-medium text-foreground">{price}</span>
                <WishOptionsMenu
                    wish_id=id
                    wish_name=name
                    link_url=link_url
                    delete_target=delete_target
                />
            </CardFooter>
        </Card>
    }
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    view! {
        <div class="space-y-2">
            <h1 class="text-lg font-semibold">"Settings"</h1>
            <Alert>
                <AlertDescription class="text-xs text-muted-foreground">
                    "There are no settings yet."
                </AlertDescription>
            </Alert>
        </div>
    }
}

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="space-y-2 py-8">
            <h1 class="text-lg font-semibold">"Page not found"</h1>
            <a class="text-sm text-primary underline underline-offset-4" href="/">"Back to dashboard"</a>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Wishlist;
    use chrono::{FixedOffset, Utc};

    fn list(id: &str, name: &str, prices: &[f64]) -> WishlistWithWishes {
        let created_at = Utc.with_ymd_and_hms(2023, 9, 4, 23, 30, 0).unwrap();
        WishlistWithWishes {
            wishlist: Wishlist {
                id: id.to_string(),
                user_id: "u1".to_string(),
                name: name.to_string(),
                created_at,
            },
            wishes: prices
                .iter()
                .enumerate()
                .map(|(i, p)| Wish {
                    id: format!("{id}-{i}"),
                    wishlist_id: id.to_string(),
                    name: format!("wish {i}"),
                    description: String::new(),
                    price: *p,
                    img_url: String::new(),
                    link_url: String::new(),
                    created_at,
                })
                .collect(),
        }
    }

    #[test]
    fn test_dashboard_rows() {
        let lists = vec![list("a", "Birthday", &[100.0, 50.0]), list("b", "Empty", &[])];
        let rows = dashboard_rows(&lists, &Utc);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].wish_count, 2);
        assert_eq!(rows[0].average_price, "75.00 DKK");
        assert_eq!(rows[0].created_at, "04. sept 2023");
        assert_eq!(rows[1].number, 2);
        assert_eq!(rows[1].average_price, "0 DKK");
    }

    #[test]
    fn test_dashboard_rows_use_viewer_time_zone() {
        let lists = vec![list("a", "Birthday", &[])];
        let cph = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(dashboard_rows(&lists, &cph)[0].created_at, "05. sept 2023");
    }

    #[test]
    fn test_find_wishlist() {
        let state = LoadState::Ready(vec![list("a", "Birthday", &[1.0]), list("b", "Xmas", &[])]);
        match find_wishlist(&state, "b") {
            LoadState::Ready(Some(w)) => assert_eq!(w.wishlist.name, "Xmas"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(find_wishlist(&state, "zzz"), LoadState::Ready(None));
        assert_eq!(find_wishlist(&LoadState::Loading, "a"), LoadState::Loading);
        assert_eq!(
            find_wishlist(&LoadState::Failed("offline".to_string()), "a"),
            LoadState::Failed("offline".to_string())
        );
    }
}
