//! Inline status banners and the pagination bar shared by list pages.

#[cfg(test)]
#[path = "status_test.rs"]
mod status_test;

use leptos::prelude::*;

#[component]
pub fn ErrorBanner(error: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some()>
            <div class="banner banner--error" role="alert">
                <span>{move || error.get().unwrap_or_default()}</span>
                <button class="banner__close" on:click=move |_| error.set(None)>"×"</button>
            </div>
        </Show>
    }
}

#[component]
pub fn Notice(notice: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || notice.get().is_some()>
            <div class="banner banner--success" role="status">{move || notice.get().unwrap_or_default()}</div>
        </Show>
    }
}

fn page_label(page: u32, total_pages: u64) -> String {
    format!("Page {page} of {}", total_pages.max(1))
}

fn has_next(page: u32, total_pages: u64) -> bool {
    u64::from(page) < total_pages
}

/// Previous/next controls over a one-based `page`.
#[component]
pub fn Pager(page: RwSignal<u32>, #[prop(into)] total_pages: Signal<u64>) -> impl IntoView {
    view! {
        <div class="pager">
            <button
                class="pager__button"
                disabled=move || page.get() <= 1
                on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))
            >
                "Previous"
            </button>
            <span class="pager__label">{move || page_label(page.get(), total_pages.get())}</span>
            <button
                class="pager__button"
                disabled=move || !has_next(page.get(), total_pages.get())
                on:click=move |_| page.update(|p| *p += 1)
            >
                "Next"
            </button>
        </div>
    }
}
