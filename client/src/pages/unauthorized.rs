//! Shown when a signed-in user opens a route their role may not see.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::state::auth::use_session;

#[component]
pub fn UnauthorizedPage() -> impl IntoView {
    let session = use_session();
    let back = move || session.snapshot.with(|s| s.profile.as_ref().map_or("/", |p| p.landing_route()).to_owned());

    view! {
        <div class="error-page">
            <h1 class="error-page__code">"401"</h1>
            <h2>"Unauthorized Access"</h2>
            <p>"You do not have permission to view this page."</p>
            <A href=back attr:class="error-page__link">"Go Back"</A>
        </div>
    }
}
