//! First-login form for invited admins.
//!
//! Invited admins arrive through an email link without a password or
//! profile details; the dashboard stays out of reach until this is done.

#[cfg(test)]
#[path = "complete_profile_test.rs"]
mod complete_profile_test;

use leptos::prelude::*;
use session::procedures::account::ProfileCompletion;

use crate::components::status::ErrorBanner;
use crate::pages::update_password::confirm_password;
use crate::state::auth::use_session;

fn completion_from_form(
    name: &str,
    age: &str,
    contact: &str,
    password: &str,
    confirmation: &str,
) -> Result<ProfileCompletion, &'static str> {
    let age = age.trim().parse::<u32>().map_err(|_| "Enter your age as a number.")?;
    let password = if password.is_empty() && confirmation.is_empty() {
        None
    } else {
        confirm_password(password, confirmation)?;
        Some(password.to_owned())
    };
    Ok(ProfileCompletion { name: name.to_owned(), age, contact: contact.to_owned(), password })
}

#[component]
pub fn CompleteProfilePage() -> impl IntoView {
    let session = use_session();
    #[cfg(feature = "hydrate")]
    let navigate = leptos_router::hooks::use_navigate();

    let name = RwSignal::new(String::new());
    let age = RwSignal::new(String::new());
    let contact = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirmation = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let completion =
            match completion_from_form(&name.get(), &age.get(), &contact.get(), &password.get(), &confirmation.get()) {
                Ok(c) => c,
                Err(msg) => {
                    error.set(Some(msg.to_owned()));
                    return;
                }
            };
        busy.set(true);

        #[cfg(feature = "hydrate")]
        {
            let navigate = navigate.clone();
            session.run(error, move |store| async move {
                let completed = store.complete_profile(completion).await;
                busy.set(false);
                completed?;
                navigate("/admin-dashboard", leptos_router::NavigateOptions::default());
                Ok(())
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (session, completion);
    };

    let field = move |label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <label class="auth-form__label">{label}</label>
            <input
                class="auth-form__input"
                type=kind
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
                disabled=move || busy.get()
            />
        }
    };

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h2>"Complete Your Profile"</h2>
                <p class="auth-card__subtitle">
                    "Please provide some additional information to complete your registration"
                </p>
                <ErrorBanner error=error/>
                <form class="auth-form" on:submit=on_submit>
                    {field("Full Name", "text", name)}
                    {field("Age", "number", age)}
                    {field("Contact Number", "tel", contact)}
                    {field("Password", "password", password)}
                    {field("Confirm Password", "password", confirmation)}
                    <button class="auth-form__submit" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Saving..." } else { "Complete Profile" }}
                    </button>
                </form>
            </div>
        </div>
    }
}
