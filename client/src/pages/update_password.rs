//! Set-a-new-password page, reached from a reset email or an admin invite.
//!
//! SYSTEM CONTEXT
//! ==============
//! The reset link signs the browser in with a recovery session before this
//! page mounts, so the update goes straight to the provider. The page is
//! public because a recovery session does not count as signed in.

#[cfg(test)]
#[path = "update_password_test.rs"]
mod update_password_test;

use leptos::prelude::*;

use crate::components::status::{ErrorBanner, Notice};
use crate::state::auth::use_session;

/// Both password fields must agree before anything is sent.
pub(crate) fn confirm_password(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password.is_empty() {
        return Err("Enter a new password.");
    }
    if password != confirmation {
        return Err("Passwords don't match");
    }
    Ok(())
}

#[component]
pub fn UpdatePasswordPage() -> impl IntoView {
    let session = use_session();
    #[cfg(feature = "hydrate")]
    let navigate = leptos_router::hooks::use_navigate();

    let password = RwSignal::new(String::new());
    let confirmation = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let notice = RwSignal::new(None::<String>);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let new_password = password.get();
        if let Err(msg) = confirm_password(&new_password, &confirmation.get()) {
            error.set(Some(msg.to_owned()));
            return;
        }
        busy.set(true);

        #[cfg(feature = "hydrate")]
        {
            let navigate = navigate.clone();
            session.run(error, move |store| async move {
                let updated = store.update_password(&new_password).await;
                busy.set(false);
                updated?;
                notice.set(Some("Password updated successfully!".to_owned()));
                gloo_timers::future::sleep(std::time::Duration::from_secs(2)).await;
                navigate("/login", leptos_router::NavigateOptions::default());
                Ok(())
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (session, new_password);
    };

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h2>"Update Password"</h2>
                <ErrorBanner error=error/>
                <Notice notice=notice/>
                <form class="auth-form" on:submit=on_submit>
                    <input
                        class="auth-form__input"
                        type="password"
                        placeholder="New Password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <input
                        class="auth-form__input"
                        type="password"
                        placeholder="Confirm New Password"
                        prop:value=move || confirmation.get()
                        on:input=move |ev| confirmation.set(event_target_value(&ev))
                    />
                    <button class="auth-form__submit" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Updating..." } else { "Update Password" }}
                    </button>
                </form>
            </div>
        </div>
    }
}
