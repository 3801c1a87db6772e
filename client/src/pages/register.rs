//! Student self-registration.

#[cfg(test)]
#[path = "register_test.rs"]
mod register_test;

use leptos::prelude::*;
use leptos_router::components::A;
use session::profile::{age_on, parse_birthday};
use time::Date;

use crate::components::status::ErrorBanner;
use crate::pages::update_password::confirm_password;
use crate::state::auth::use_session;
use crate::util::clock;

/// Age shown next to the birthday field while the user types.
fn age_preview(birthday: &str, today: Date) -> Option<u32> {
    parse_birthday(birthday).map(|b| age_on(b, today))
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let session = use_session();
    #[cfg(feature = "hydrate")]
    let navigate = leptos_router::hooks::use_navigate();

    let name = RwSignal::new(String::new());
    let birthday = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirmation = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let age = move || birthday.with(|b| age_preview(b, clock::today()));

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        if let Err(msg) = confirm_password(&password.get(), &confirmation.get()) {
            error.set(Some(msg.to_owned()));
            return;
        }
        let registration = session::procedures::account::StudentRegistration {
            email: email.get(),
            password: password.get(),
            name: name.get(),
            birthday: birthday.get(),
        };
        busy.set(true);

        #[cfg(feature = "hydrate")]
        {
            let navigate = navigate.clone();
            session.run(error, move |store| async move {
                let registered = store.register_student(registration, clock::today()).await;
                busy.set(false);
                registered?;
                navigate("/login?registered=1", leptos_router::NavigateOptions::default());
                Ok(())
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (session, registration);
    };

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h2>"Create New Account"</h2>
                <ErrorBanner error=error/>
                <form class="auth-form" on:submit=on_submit>
                    <label class="auth-form__label">"Name"</label>
                    <input
                        class="auth-form__input"
                        type="text"
                        prop:value=move || name.get()
                        on:input=move |ev| name.set(event_target_value(&ev))
                    />
                    <label class="auth-form__label">"Birthday"</label>
                    <input
                        class="auth-form__input"
                        type="date"
                        prop:value=move || birthday.get()
                        on:input=move |ev| birthday.set(event_target_value(&ev))
                    />
                    <Show when=move || age().is_some()>
                        <span class="auth-form__hint">{move || format!("Age: {}", age().unwrap_or_default())}</span>
                    </Show>
                    <label class="auth-form__label">"Email"</label>
                    <input
                        class="auth-form__input"
                        type="email"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <label class="auth-form__label">"Password"</label>
                    <input
                        class="auth-form__input"
                        type="password"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <label class="auth-form__label">"Confirm Password"</label>
                    <input
                        class="auth-form__input"
                        type="password"
                        prop:value=move || confirmation.get()
                        on:input=move |ev| confirmation.set(event_target_value(&ev))
                    />
                    <button class="auth-form__submit" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { "Registering account..." } else { "Register" }}
                    </button>
                </form>
                <p class="auth-card__footer">
                    "Already have an account? " <A href="/login">"Login"</A>
                </p>
            </div>
        </div>
    }
}
