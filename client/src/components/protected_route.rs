//! Route wrapper that renders its children only for permitted sessions.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every guarded route in `app` wraps its page in `ProtectedRoute`. The
//! decision itself is `session::guard::evaluate`, re-run whenever the session
//! snapshot or the location changes; this component only turns it into a
//! loading indicator, the page, or a replacing navigation.

#[cfg(test)]
#[path = "protected_route_test.rs"]
mod protected_route_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};
use session::guard::{self, GuardDecision};
use session::RouteAccess;

use crate::state::auth::use_session;

/// In-app location (path plus query) to remember for after sign-in.
fn requested_location(pathname: &str, search: &str) -> String {
    let query = search.trim_start_matches('?');
    if query.is_empty() { pathname.to_owned() } else { format!("{pathname}?{query}") }
}

/// Navigation target for a decision, if it redirects.
fn redirect_target(decision: &GuardDecision) -> Option<&str> {
    match decision {
        GuardDecision::RedirectLogin { to } | GuardDecision::RedirectUnauthorized { to } => Some(to),
        GuardDecision::Pending | GuardDecision::Render => None,
    }
}

#[component]
pub fn ProtectedRoute(#[prop(optional)] access: RouteAccess, children: ChildrenFn) -> impl IntoView {
    let session = use_session();
    let location = use_location();
    let navigate = use_navigate();

    let decision = Memo::new(move |_| {
        let requested = requested_location(&location.pathname.get(), &location.search.get());
        guard::evaluate(&session.snapshot.get(), access, &requested)
    });

    Effect::new(move || {
        let decision = decision.get();
        if let Some(to) = redirect_target(&decision) {
            navigate(to, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    move || match decision.get() {
        GuardDecision::Render => children().into_any(),
        GuardDecision::Pending => view! {
            <div class="route-pending" role="status">
                <span class="route-pending__spinner"></span>
                "Loading..."
            </div>
        }
        .into_any(),
        GuardDecision::RedirectLogin { .. } | GuardDecision::RedirectUnauthorized { .. } => ().into_any(),
    }
}
