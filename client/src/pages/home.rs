//! Public landing page.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::state::auth::use_session;

#[component]
pub fn HomePage() -> impl IntoView {
    let session = use_session();
    let landing = move || {
        session
            .snapshot
            .with(|s| s.profile.as_ref().filter(|_| s.is_authenticated()).map(|p| p.landing_route()))
    };

    view! {
        <div class="home-page">
            <section class="home-hero">
                <h1>"MIRA"</h1>
                <p class="home-hero__tagline">
                    "A safe place to talk things through, find campus support, and tell us how we are doing."
                </p>
                {move || match landing() {
                    Some(href) => view! { <A href=href attr:class="home-hero__cta">"Continue"</A> }.into_any(),
                    None => view! {
                        <div class="home-hero__actions">
                            <A href="/register" attr:class="home-hero__cta">"Get Started"</A>
                            <A href="/login" attr:class="home-hero__link">"I already have an account"</A>
                        </div>
                    }
                    .into_any(),
                }}
            </section>
            <section class="home-features">
                <div class="home-feature">
                    <h3>"Chat"</h3>
                    <p>"Talk with the MIRA assistant any time, day or night."</p>
                </div>
                <div class="home-feature">
                    <h3>"Resources"</h3>
                    <p>"Browse counselling services and student associations."</p>
                </div>
                <div class="home-feature">
                    <h3>"Feedback"</h3>
                    <p>"Help us improve by sharing what works and what does not."</p>
                </div>
            </section>
        </div>
    }
}
