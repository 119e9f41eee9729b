use crate::state::toasts::{Toast, ToastKind};
use crate::state::AppContext;
use icons::{Check, LoaderCircle, X};
use leptos::prelude::*;

#[component]
pub fn Toaster() -> impl IntoView {
    let app = expect_context::<AppContext>();
    let toasts = app.0.toasts;

    view! {
        <div
            data-name="Toaster"
            class="pointer-events-none fixed bottom-4 right-4 z-[60] flex w-72 flex-col gap-2"
            aria-live="polite"
        >
            <For each=move || toasts.items() key=|t| (t.id, t.revision) let:toast>
                <ToastItem toast=toast on_dismiss=move |id: u64| toasts.dismiss(id) />
            </For>
        </div>
    }
}

#[component]
fn ToastItem(toast: Toast, #[prop(into)] on_dismiss: Callback<u64>) -> impl IntoView {
    let id = toast.id;
    let kind: &str = toast.kind.as_ref();
    let kind = kind.to_string();
    let icon = match toast.kind {
        ToastKind::Loading => view! { <LoaderCircle class="size-4 animate-spin text-muted-foreground" /> }.into_any(),
        ToastKind::Success => view! { <Check class="size-4 text-green-600" /> }.into_any(),
        ToastKind::Error => view! { <X class="size-4 text-destructive" /> }.into_any(),
    };

    view! {
        <div
            data-kind=kind
            class="pointer-events-auto flex items-center gap-2 rounded-md border bg-background px-3 py-2 text-xs shadow-md data-[kind=error]:border-destructive/30"
            role="status"
        >
            {icon}
            <span class="flex-1">{toast.message}</span>
            <button
                type="button"
                class="text-muted-foreground hover:text-foreground"
                aria-label="Dismiss"
                on:click=move |_| on_dismiss.run(id)
            >
                "×"
            </button>
        </div>
    }
}
