//! Login page: email + password sign-in, resend-verification, and the
//! password-reset request form.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use session::Credentials;

use crate::components::status::{ErrorBanner, Notice};
use crate::state::auth::use_session;

fn validate_credentials(email: &str, password: &str) -> Result<Credentials, &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err("Enter your email and password.");
    }
    if !email.contains('@') {
        return Err("Enter a valid email address.");
    }
    Ok(Credentials::new(email, password))
}

fn validate_reset_email(raw: &str) -> Result<String, &'static str> {
    let email = raw.trim();
    if email.is_empty() {
        return Err("Please enter your email address");
    }
    Ok(email.to_owned())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let session = use_session();
    let query = use_query_map();
    #[cfg(feature = "hydrate")]
    let navigate = leptos_router::hooks::use_navigate();

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let show_password = RwSignal::new(false);
    let busy = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let notice = RwSignal::new(
        query
            .with_untracked(|q| q.get("registered"))
            .map(|_| "Registration successful! Please verify your email before logging in.".to_owned()),
    );
    let unverified = RwSignal::new(None::<String>);
    let resetting = RwSignal::new(false);
    let reset_email = RwSignal::new(String::new());

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let credentials = match validate_credentials(&email.get(), &password.get()) {
            Ok(c) => c,
            Err(msg) => {
                error.set(Some(msg.to_owned()));
                return;
            }
        };
        busy.set(true);
        unverified.set(None);
        let from = query.with(|q| q.get("from"));

        #[cfg(feature = "hydrate")]
        {
            let navigate = navigate.clone();
            session.run(error, move |store| async move {
                let outcome = store.sign_in(credentials).await;
                busy.set(false);
                match outcome? {
                    session::SignInOutcome::SignedIn { landing, .. } => {
                        let target = session::guard::post_login_target(from.as_deref(), landing);
                        navigate(&target, leptos_router::NavigateOptions::default());
                    }
                    session::SignInOutcome::NeedsVerification(required) => {
                        error.set(Some(required.message));
                        unverified.set(Some(required.email));
                    }
                }
                Ok(())
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = (credentials, from);
    };

    let on_resend = move |_| {
        let Some(address) = unverified.get() else {
            return;
        };
        session.run(error, move |store| async move {
            store.resend_verification(&address).await?;
            unverified.set(None);
            notice.set(Some("Verification email sent. Check your inbox.".to_owned()));
            Ok(())
        });
    };

    let on_reset = move |_| {
        let address = match validate_reset_email(&reset_email.get()) {
            Ok(a) => a,
            Err(msg) => {
                error.set(Some(msg.to_owned()));
                return;
            }
        };
        busy.set(true);
        session.run(error, move |store| async move {
            let sent = store.reset_password(&address).await;
            busy.set(false);
            sent?;
            notice.set(Some("Password reset link sent to your email!".to_owned()));
            Ok(())
        });
    };

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <ErrorBanner error=error/>
                <Notice notice=notice/>
                <div class="auth-card__section" hidden=move || resetting.get()>
                    <h2>"Welcome Back"</h2>
                    <p class="auth-card__subtitle">"Sign in to continue to your account"</p>
                    <form class="auth-form" on:submit=on_submit>
                        <label class="auth-form__label">"Email Address"</label>
                        <input
                            class="auth-form__input"
                            type="email"
                            placeholder="your@email.com"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                        <label class="auth-form__label">"Password"</label>
                        <div class="auth-form__password">
                            <input
                                class="auth-form__input"
                                type=move || if show_password.get() { "text" } else { "password" }
                                placeholder="Password"
                                prop:value=move || password.get()
                                on:input=move |ev| password.set(event_target_value(&ev))
                            />
                            <button
                                type="button"
                                class="auth-form__toggle"
                                on:click=move |_| show_password.update(|v| *v = !*v)
                            >
                                {move || if show_password.get() { "Hide" } else { "Show" }}
                            </button>
                        </div>
                        <button class="auth-form__submit" type="submit" disabled=move || busy.get()>
                            {move || if busy.get() { "Logging In..." } else { "Log In" }}
                        </button>
                    </form>
                    <Show when=move || unverified.get().is_some()>
                        <button class="auth-form__link" on:click=on_resend>
                            "Resend verification email"
                        </button>
                    </Show>
                    <button class="auth-form__link" on:click=move |_| resetting.set(true)>
                        "Forgot password?"
                    </button>
                    <p class="auth-card__footer">"No account yet? " <a href="/register">"Register"</a></p>
                </div>
                <div class="auth-card__section" hidden=move || !resetting.get()>
                    <button class="auth-form__back" on:click=move |_| resetting.set(false)>
                        "Back to Login"
                    </button>
                    <h2>"Reset Password"</h2>
                    <p class="auth-card__subtitle">"Enter your email to receive a reset link"</p>
                    <input
                        class="auth-form__input"
                        type="email"
                        placeholder="your@email.com"
                        prop:value=move || reset_email.get()
                        on:input=move |ev| reset_email.set(event_target_value(&ev))
                    />
                    <button class="auth-form__submit" on:click=on_reset disabled=move || busy.get()>
                        {move || if busy.get() { "Sending..." } else { "Send Reset Link" }}
                    </button>
                </div>
            </div>
        </div>
    }
}
