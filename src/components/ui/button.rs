use leptos::prelude::*;
use leptos_ui::variants;

variants! {
    Button {
        base: "inline-flex items-center justify-center gap-2 whitespace-nowrap rounded-md text-sm font-medium transition-all disabled:pointer-events-none disabled:opacity-50 [&_svg]:pointer-events-none [&_svg:not([class*='size-'])]:size-4 shrink-0 [&_svg]:shrink-0 outline-none focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-[3px] w-fit hover:cursor-pointer active:scale-[0.98] touch-manipulation select-none",
        variants: {
            variant: {
                Default: "bg-primary text-primary-foreground shadow-xs hover:bg-primary/90",
                Destructive: "bg-destructive text-white shadow-xs hover:bg-destructive/90 focus-visible:ring-destructive/20",
                Outline: "border bg-border/30 shadow-xs hover:bg-border/50 hover:text-foreground",
                Secondary: "bg-secondary text-secondary-foreground shadow-xs hover:bg-secondary/80",
                Ghost: "hover:bg-accent hover:text-accent-foreground",
                Link: "text-primary underline-offset-4 hover:underline",
            },
            size: {
                Default: "h-9 px-4 py-2 has-[>svg]:px-3",
                Sm: "h-8 rounded-md gap-1.5 px-3 has-[>svg]:px-2.5",
                Icon: "size-9",
            }
        },
        component: {
            element: button,
            support_href: true,
            support_aria_current: true
        }
    }
}

/// Submit button that disables itself and shows a spinner while `loading` is set.
#[component]
pub fn SubmitButton(
    #[prop(into)] loading: Signal<bool>,
    #[prop(into)] label: String,
    #[prop(into)] pending_label: String,
    #[prop(optional)] variant: ButtonVariant,
    #[prop(into, optional)] class: String,
) -> impl IntoView {
    view! {
        <Button
            class=class
            variant=variant
            size=ButtonSize::Sm
            attr:r#type="submit"
            attr:disabled=move || loading.get()
        >
            <span class="inline-flex items-center gap-2">
                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <crate::components::ui::Spinner />
                </Show>
                {move || if loading.get() { pending_label.clone() } else { label.clone() }}
            </span>
        </Button>
    }
}
