//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App` provides the `SessionContext` every page reads. In the browser it
//! also builds the backend clients, the session store, and the change-feed
//! hub, then kicks off identity resolution and the session-change watcher.
//! On the server the context stays in its loading state, so guarded routes
//! render their pending indicator until hydration takes over.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};
use session::RouteAccess;

use crate::components::nav_bar::NavBar;
use crate::components::protected_route::ProtectedRoute;
use crate::pages::{
    admin_dashboard::AdminDashboardPage, chat::ChatPage, complete_profile::CompleteProfilePage,
    feedback::FeedbackPage, home::HomePage, invite_admin::InviteAdminPage, login::LoginPage,
    manage_user::ManageUserPage, not_found::NotFoundPage, profile::ProfilePage, register::RegisterPage,
    unauthorized::UnauthorizedPage, update_password::UpdatePasswordPage, view_feedback::ViewFeedbackPage,
    view_resources::ViewResourcesPage,
};
use crate::state::auth::SessionContext;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let session = SessionContext::new();
    provide_context(session);

    #[cfg(feature = "hydrate")]
    connect(session);

    view! {
        <Stylesheet id="leptos" href="/pkg/mira.css"/>
        <Title text="MIRA"/>

        <Router>
            <NavBar/>
            <main class="app-main">
                <Routes fallback=NotFoundPage>
                    <Route path=StaticSegment("") view=HomePage/>
                    <Route path=StaticSegment("login") view=LoginPage/>
                    <Route path=StaticSegment("register") view=RegisterPage/>
                    <Route path=StaticSegment("update-password") view=UpdatePasswordPage/>
                    <Route path=StaticSegment("401-unauthorized") view=UnauthorizedPage/>

                    <Route
                        path=StaticSegment("chat")
                        view=|| view! { <ProtectedRoute access=RouteAccess::STUDENT_ONLY><ChatPage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("feedback")
                        view=|| view! { <ProtectedRoute access=RouteAccess::STUDENT_ONLY><FeedbackPage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("profile")
                        view=|| view! { <ProtectedRoute access=RouteAccess::STUDENT_ONLY><ProfilePage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("view-resources")
                        view=|| view! { <ProtectedRoute><ViewResourcesPage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("complete-profile")
                        view=|| view! { <ProtectedRoute access=RouteAccess::ADMIN_ONLY><CompleteProfilePage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("admin-dashboard")
                        view=|| view! { <ProtectedRoute access=RouteAccess::ADMIN_ONLY><AdminDashboardPage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("manage-user")
                        view=|| view! { <ProtectedRoute access=RouteAccess::ADMIN_ONLY><ManageUserPage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("view-feedback")
                        view=|| view! { <ProtectedRoute access=RouteAccess::ADMIN_ONLY><ViewFeedbackPage/></ProtectedRoute> }
                    />
                    <Route
                        path=StaticSegment("invite-admin")
                        view=|| view! { <ProtectedRoute access=RouteAccess::SuperAdmin><InviteAdminPage/></ProtectedRoute> }
                    />
                </Routes>
            </main>
        </Router>
    }
}

/// Build the browser backend and bind it to `ctx`.
///
/// ERROR HANDLING
/// ==============
/// Missing build-time backend settings leave the app usable as a static
/// site: the session is marked signed out and guarded routes send visitors
/// to the login page.
#[cfg(feature = "hydrate")]
fn connect(ctx: SessionContext) {
    use std::rc::Rc;

    use session::{ChangeFeedHub, SessionStore};

    use crate::net::config::{BackendEnv, site_origin};
    use crate::net::realtime::RealtimeClient;
    use crate::net::supabase::BackendClient;

    let env = match BackendEnv::from_build_env() {
        Ok(env) => env,
        Err(e) => {
            log::error!("backend not configured: {e}");
            ctx.detach();
            return;
        }
    };
    let config = env.session_config(site_origin().as_deref());
    let backend = BackendClient::new(env);
    let feed = ChangeFeedHub::new(Rc::new(RealtimeClient::new(backend.clone())));
    let store = SessionStore::new(backend.clone(), backend.clone(), config);
    ctx.attach(store.clone(), feed);

    leptos::task::spawn_local(BackendClient::keep_fresh(Rc::downgrade(&backend)));
    let boot = store.clone();
    leptos::task::spawn_local(async move {
        // A sign-in or recovery link lands with tokens in the fragment.
        backend.absorb_redirect().await;
        let phase = boot.initialize().await;
        log::info!("session resolved: {phase:?}");
    });
    leptos::task::spawn_local(async move { store.watch_session_changes().await });

    on_cleanup(move || ctx.dispose());
}
