//! Top navigation bar with role-aware links and sign-out.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::state::auth::{display_name, nav_links, use_session};

#[component]
pub fn NavBar() -> impl IntoView {
    let session = use_session();
    let busy = RwSignal::new(false);

    let on_sign_out = move |_| {
        if busy.get() {
            return;
        }
        busy.set(true);

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            if let Some(store) = session.store() {
                if let Err(e) = store.sign_out().await {
                    log::warn!("sign-out did not reach the provider: {e}");
                }
            }
            // Guarded pages redirect themselves once the snapshot clears.
            busy.set(false);
        });
    };

    view! {
        <header class="nav-bar">
            <a class="nav-bar__brand" href="/">"MIRA"</a>
            <nav class="nav-bar__links">
                <For
                    each=move || nav_links(&session.snapshot.get())
                    key=|link| link.href
                    children=|link| view! { <A href=link.href>{link.label}</A> }
                />
            </nav>
            <Show when=move || session.snapshot.get().is_authenticated()>
                <span class="nav-bar__user">{move || display_name(&session.snapshot.get())}</span>
                <button class="nav-bar__logout" on:click=on_sign_out disabled=move || busy.get()>
                    "Log Out"
                </button>
            </Show>
        </header>
    }
}
