use crate::components::ui::{Button, ButtonSize, ButtonVariant, Menu, MenuItem, MenuLabel};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_location;

const OAUTH_PROVIDER: &str = "google";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

const NAV_LINKS: [(&str, &str); 2] = [("Dashboard", "/"), ("Settings", "/settings")];

/// Navigation entries with the active one derived from `pathname`.
///
/// `/wishlist/:id` is reached from the dashboard, so it keeps Dashboard active.
pub(crate) fn nav_items(pathname: &str) -> Vec<NavItem> {
    let path = pathname.trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    NAV_LINKS
        .iter()
        .map(|&(label, href)| {
            let active = if href == "/" {
                path == "/" || path.starts_with("/wishlist/")
            } else {
                path == href || path.starts_with(&format!("{href}/"))
            };
            NavItem { label, href, active }
        })
        .collect()
}

fn current_origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

#[component]
pub fn Navbar() -> impl IntoView {
    let app = expect_context::<AppContext>();
    let session = app.0.session;
    let auth_ready = app.0.auth_ready;
    let location = use_location();
    let mobile_open = RwSignal::new(false);

    let items = Memo::new(move |_| nav_items(&location.pathname.get()));

    // Close the mobile menu after navigating.
    Effect::new(move |_| {
        location.pathname.track();
        mobile_open.set(false);
    });

    let toasts = app.0.toasts;
    let auth = app.0.auth.clone();
    let on_login = Callback::new(move |_: ()| {
        let origin = current_origin();
        if let Err(e) = auth.sign_in_with_provider(OAUTH_PROVIDER, &origin) {
            log::error!("sign-in failed: {e}");
            toasts.error(None, "Could not start sign-in.");
        }
    });

    let auth = app.0.auth.clone();
    let on_sign_out = Callback::new(move |_: ()| {
        let auth = auth.clone();
        spawn_local(async move { auth.sign_out().await });
    });

    let email = move || {
        session.with(|s| {
            s.as_ref()
                .and_then(|s| s.user.email.clone())
                .unwrap_or_else(|| "Signed in".to_string())
        })
    };

    let link_class = |active: bool, stacked: bool| {
        let base = if stacked {
            "block rounded-md px-3 py-2 text-sm"
        } else {
            "rounded-md px-3 py-1.5 text-sm"
        };
        if active {
            format!("{base} bg-accent font-medium text-foreground")
        } else {
            format!("{base} text-muted-foreground hover:text-foreground")
        }
    };

    view! {
        <header class="border-b border-border bg-background">
            <nav class="mx-auto flex h-14 max-w-5xl items-center gap-4 px-4">
                <a href="/" class="text-sm font-semibold text-foreground">"Wishlist"</a>

                <div class="hidden items-center gap-1 md:flex">
                    {move || {
                        items
                            .get()
                            .into_iter()
                            .map(|item| {
                                view! {
                                    <a
                                        href=item.href
                                        class=link_class(item.active, false)
                                        aria-current=item.active.then_some("page")
                                    >
                                        {item.label}
                                    </a>
                                }
                            })
                            .collect_view()
                    }}
                </div>

                <div class="ml-auto flex items-center gap-2">
                    <Show when=move || auth_ready.get() fallback=|| ().into_view()>
                        {move || if session.with(|s| s.is_some()) {
                            view! {
                                <Menu trigger=move || view! {
                                    <Button variant=ButtonVariant::Outline size=ButtonSize::Sm attr:aria-label="Profile">
                                        "Profile"
                                    </Button>
                                }>
                                    <MenuLabel>{email}</MenuLabel>
                                    <MenuItem on_select=on_sign_out>"Sign out"</MenuItem>
                                </Menu>
                            }
                            .into_any()
                        } else {
                            view! {
                                <Button size=ButtonSize::Sm on:click=move |_| on_login.run(())>
                                    "Login"
                                </Button>
                            }
                            .into_any()
                        }}
                    </Show>

                    <Button
                        class="md:hidden"
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Icon
                        attr:aria-label="Toggle menu"
                        attr:aria-expanded=move || if mobile_open.get() { "true" } else { "false" }
                        on:click=move |_| mobile_open.update(|v| *v = !*v)
                    >
                        <svg
                            xmlns="http://www.w3.org/2000/svg"
                            width="18"
                            height="18"
                            viewBox="0 0 24 24"
                            fill="none"
                            stroke="currentColor"
                            stroke-width="2"
                            stroke-linecap="round"
                            stroke-linejoin="round"
                            aria-hidden="true"
                        >
                            <path d="M4 6h16" />
                            <path d="M4 12h16" />
                            <path d="M4 18h16" />
                        </svg>
                    </Button>
                </div>
            </nav>

            <Show when=move || mobile_open.get() fallback=|| ().into_view()>
                <div class="space-y-1 border-t border-border px-4 py-2 md:hidden">
                    {move || {
                        items
                            .get()
                            .into_iter()
                            .map(|item| {
                                view! {
                                    <a href=item.href class=link_class(item.active, true)>
                                        {item.label}
                                    </a>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </Show>
        </header>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(pathname: &str) -> Vec<&'static str> {
        nav_items(pathname)
            .into_iter()
            .filter(|i| i.active)
            .map(|i| i.label)
            .collect()
    }

    #[test]
    fn test_active_item_follows_pathname() {
        assert_eq!(active("/"), vec!["Dashboard"]);
        assert_eq!(active("/settings"), vec!["Settings"]);
        assert_eq!(active("/settings/"), vec!["Settings"]);
        assert_eq!(active("/wishlist/abc"), vec!["Dashboard"]);
    }

    #[test]
    fn test_unknown_path_has_no_active_item() {
        assert!(active("/nowhere").is_empty());
        assert!(active("/settingsx").is_empty());
    }

    #[test]
    fn test_items_keep_order() {
        let labels: Vec<_> = nav_items("/").into_iter().map(|i| (i.label, i.href)).collect();
        assert_eq!(labels, vec![("Dashboard", "/"), ("Settings", "/settings")]);
    }
}
