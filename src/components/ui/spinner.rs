use icons::Loader;
use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Spinner(
    #[prop(into, optional)] class: String,
    #[prop(into, default = "Loading".to_string())] label: String,
) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);

    view! { <Loader class=merged_class attr:role="status" attr:aria-label=label /> }
}

/// Full-width placeholder shown while a route waits for data.
#[component]
pub fn LoadingBlock(#[prop(into)] message: String) -> impl IntoView {
    view! {
        <div class="flex items-center gap-2 py-8 text-sm text-muted-foreground">
            <Spinner />
            <span>{message}</span>
        </div>
    }
}
