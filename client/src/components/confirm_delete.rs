//! Modal confirmation before a destructive action.

use leptos::prelude::*;

/// Shown while `target` holds the id awaiting deletion; `on_confirm`
/// receives that id and the dialog closes either way.
#[component]
pub fn ConfirmDelete(
    target: RwSignal<Option<String>>,
    title: &'static str,
    message: &'static str,
    on_confirm: Callback<String>,
) -> impl IntoView {
    let cancel = move || target.set(None);
    let confirm = move || {
        if let Some(id) = target.get_untracked() {
            on_confirm.run(id);
        }
        target.set(None);
    };

    view! {
        <Show when=move || target.get().is_some()>
            <div class="dialog-backdrop" on:click=move |_| cancel()>
                <div class="dialog" on:click=move |ev| ev.stop_propagation()>
                    <h2>{title}</h2>
                    <p class="dialog__danger">{message}</p>
                    <div class="dialog__actions">
                        <button class="btn" on:click=move |_| cancel()>"Cancel"</button>
                        <button class="btn btn--danger" on:click=move |_| confirm()>"Delete"</button>
                    </div>
                </div>
            </div>
        </Show>
    }
}
