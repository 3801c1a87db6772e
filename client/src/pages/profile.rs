//! Student profile page with inline editing of name and birthday.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use leptos::prelude::*;
use session::profile::ProfileUpdate;

use crate::components::status::{ErrorBanner, Notice};
use crate::state::auth::use_session;

/// Only fields that actually changed are sent.
fn changed_fields(name: &str, original_name: &str, birthday: &str, original_birthday: &str) -> ProfileUpdate {
    ProfileUpdate {
        name: (name.trim() != original_name.trim()).then(|| name.to_owned()),
        avatar: None,
        birthday: (birthday.trim() != original_birthday.trim() && !birthday.trim().is_empty())
            .then(|| birthday.trim().to_owned()),
    }
}

/// Placeholder avatar text for users without a picture.
fn initials(name: &str) -> String {
    name.split_whitespace().filter_map(|w| w.chars().next()).take(2).flat_map(char::to_uppercase).collect()
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let session = use_session();

    let editing = RwSignal::new(false);
    let name = RwSignal::new(String::new());
    let birthday = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let notice = RwSignal::new(None::<String>);

    let profile = move || session.snapshot.with(|s| s.profile.clone());
    let current_name = move || profile().map(|p| p.name).unwrap_or_default();
    let current_birthday = move || profile().and_then(|p| p.student().and_then(|s| s.birthday.clone())).unwrap_or_default();
    let avatar_url = move || {
        let path = profile()?.avatar?;
        session.store().map(|store| store.config().profile_image_url(&path))
    };

    let start_edit = move |_| {
        name.set(current_name());
        birthday.set(current_birthday());
        notice.set(None);
        editing.set(true);
    };

    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let update = changed_fields(&name.get(), &current_name(), &birthday.get(), &current_birthday());
        if update.is_empty() {
            editing.set(false);
            return;
        }
        busy.set(true);
        session.run(error, move |store| async move {
            let saved = store.update_profile(update).await;
            busy.set(false);
            saved?;
            editing.set(false);
            notice.set(Some("Profile updated successfully!".to_owned()));
            Ok(())
        });
    };

    view! {
        <div class="profile-page">
            <div class="profile-card">
                <ErrorBanner error=error/>
                <Notice notice=notice/>
                <div class="profile-card__avatar">
                    {move || match avatar_url() {
                        Some(src) => view! { <img src=src alt="Profile picture"/> }.into_any(),
                        None => view! { <span class="profile-card__initials">{initials(&current_name())}</span> }
                            .into_any(),
                    }}
                </div>
                <div hidden=move || editing.get()>
                    <h2 class="profile-card__name">{current_name}</h2>
                    <p class="profile-card__email">{move || profile().and_then(|p| p.email).unwrap_or_default()}</p>
                    <dl class="profile-card__details">
                        <dt>"Birthday"</dt>
                        <dd>{current_birthday}</dd>
                        <dt>"Age"</dt>
                        <dd>
                            {move || {
                                profile()
                                    .and_then(|p| p.student().and_then(|s| s.age))
                                    .map(|a| a.to_string())
                                    .unwrap_or_else(|| "N/A".to_owned())
                            }}
                        </dd>
                    </dl>
                    <button class="profile-card__edit" on:click=start_edit>"Edit Profile"</button>
                </div>
                <form class="profile-form" hidden=move || !editing.get() on:submit=on_save>
                    <label class="profile-form__label">"Name"</label>
                    <input
                        class="profile-form__input"
                        prop:value=move || name.get()
                        on:input=move |ev| name.set(event_target_value(&ev))
                    />
                    <label class="profile-form__label">"Birthday"</label>
                    <input
                        class="profile-form__input"
                        type="date"
                        prop:value=move || birthday.get()
                        on:input=move |ev| birthday.set(event_target_value(&ev))
                    />
                    <div class="profile-form__actions">
                        <button type="submit" disabled=move || busy.get()>
                            {move || if busy.get() { "Saving..." } else { "Save" }}
                        </button>
                        <button type="button" on:click=move |_| editing.set(false)>"Cancel"</button>
                    </div>
                </form>
            </div>
        </div>
    }
}
