use crate::components::ui::input::FIELD_CLASS;
use leptos::prelude::*;
use tw_merge::tw_merge;
use wasm_bindgen::JsCast;

#[component]
pub fn Textarea(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(into, optional)] name: String,
    #[prop(into, optional)] id: String,
    #[prop(optional)] required: bool,
    #[prop(default = 3)] rows: u32,
    #[prop(into)] bind_value: RwSignal<String>,
    #[prop(optional)] touched: Option<RwSignal<bool>>,
    #[prop(default = false.into(), into)] invalid: Signal<bool>,
    #[prop(default = false.into(), into)] disabled: Signal<bool>,
) -> impl IntoView {
    let merged_class = tw_merge!(FIELD_CLASS, "min-h-16 py-2 resize-none", class);

    let on_input = move |ev: web_sys::Event| {
        if let Some(el) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
        {
            bind_value.set(el.value());
            if let Some(t) = touched {
                t.set(true);
            }
        }
    };

    view! {
        <textarea
            data-name="Textarea"
            class=merged_class
            placeholder=placeholder
            name=name
            id=id
            rows=rows.to_string()
            required=required
            disabled=move || disabled.get()
            aria-invalid=move || if invalid.get() { Some("true") } else { None }
            prop:value=move || bind_value.get()
            on:input=on_input
        />
    }
}
