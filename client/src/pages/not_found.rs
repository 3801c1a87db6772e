//! Router fallback.

use leptos::prelude::*;
use leptos_router::components::A;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="error-page">
            <h1 class="error-page__code">"404"</h1>
            <h2>"Page Not Found"</h2>
            <p>"The page you are looking for does not exist."</p>
            <A href="/" attr:class="error-page__link">"Back to Home"</A>
        </div>
    }
}
