use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertTitle, h4, "mb-1 font-medium tracking-tight leading-none"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

pub use components::*;

#[component]
pub fn ErrorAlert(#[prop(into)] title: String, #[prop(into)] message: String) -> impl IntoView {
    view! {
        <Alert class="border-destructive/30">
            <AlertTitle class="text-destructive">{title}</AlertTitle>
            <AlertDescription class="text-destructive">{message}</AlertDescription>
        </Alert>
    }
}
