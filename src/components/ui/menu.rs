use leptos::prelude::*;
use tw_merge::tw_merge;

#[derive(Clone, Copy)]
struct MenuContext {
    open: RwSignal<bool>,
}

/// Click-to-open dropdown. The trigger toggles; clicking outside or on an item closes it.
#[component]
pub fn Menu(
    #[prop(into)] trigger: ViewFn,
    #[prop(into, optional)] class: String,
    children: ChildrenFn,
) -> impl IntoView {
    let open = RwSignal::new(false);
    provide_context(MenuContext { open });
    let children = StoredValue::new(children);

    let content_class = tw_merge!(
        "absolute right-0 z-50 mt-1 min-w-[10rem] overflow-hidden rounded-md border bg-background p-1 shadow-md",
        class
    );

    view! {
        <div data-name="Menu" class="relative inline-block">
            <div
                data-name="MenuTrigger"
                on:click=move |ev: web_sys::MouseEvent| {
                    ev.stop_propagation();
                    open.update(|v| *v = !*v);
                }
            >
                {trigger.run()}
            </div>
            <Show when=move || open.get() fallback=|| ().into_view()>
                // Invisible full-screen layer that catches outside clicks.
                <div class="fixed inset-0 z-40" on:click=move |_| open.set(false)></div>
                <div data-name="MenuContent" role="menu" class=content_class.clone()>
                    {children.with_value(|c| c())}
                </div>
            </Show>
        </div>
    }
}

#[component]
pub fn MenuItem(
    #[prop(into)] on_select: Callback<()>,
    #[prop(into, optional)] class: String,
    children: Children,
) -> impl IntoView {
    let ctx = expect_context::<MenuContext>();
    let merged_class = tw_merge!(
        "flex w-full cursor-pointer items-center gap-2 rounded-sm px-2 py-1.5 text-left text-sm hover:bg-accent hover:text-accent-foreground",
        class
    );

    view! {
        <button
            type="button"
            role="menuitem"
            class=merged_class
            on:click=move |ev: web_sys::MouseEvent| {
                ev.stop_propagation();
                ctx.open.set(false);
                on_select.run(());
            }
        >
            {children()}
        </button>
    }
}

#[component]
pub fn MenuLabel(children: Children) -> impl IntoView {
    view! { <div class="truncate px-2 py-1.5 text-xs text-muted-foreground">{children()}</div> }
}
