use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {ModalTitle, h2, "text-sm font-medium"}
    clx! {ModalDescription, p, "mt-1 text-xs text-muted-foreground"}
    clx! {ModalFooter, div, "flex justify-end gap-2 pt-2"}
}

pub use components::*;

/// Centered overlay dialog. Escape asks the owner to close; the owner decides
/// (e.g. refuses while a request is pending).
#[component]
pub fn Modal(
    #[prop(into)] open: Signal<bool>,
    #[prop(into)] on_close: Callback<()>,
    children: ChildrenFn,
) -> impl IntoView {
    let children = StoredValue::new(children);

    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" && open.get_untracked() {
            ev.prevent_default();
            on_close.run(());
        }
    });
    on_cleanup(move || key_handle.remove());

    view! {
        <Show when=move || open.get() fallback=|| ().into_view()>
            <div
                data-name="Modal"
                class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4"
                role="dialog"
                aria-modal="true"
            >
                <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                    {children.with_value(|c| c())}
                </div>
            </div>
        </Show>
    }
}
