use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground relative flex flex-col overflow-hidden rounded-xl border shadow-sm"}
    clx! {CardContent, div, "space-y-1 p-5"}
    clx! {CardTitle, h2, "line-clamp-1 font-semibold leading-none"}
    clx! {CardDescription, p, "line-clamp-2 text-muted-foreground text-sm"}
    clx! {CardFooter, footer, "flex items-center justify-between border-t px-5 py-4 text-sm text-muted-foreground", "gap-2"}
    clx! {CardGrid, div, "mt-6 grid gap-6 md:grid-cols-3"}
}

pub use components::*;
