//! Reactive mirror of the session store for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store itself is `!Send` (it holds the browser backend client), so it
//! lives in local stored values. Components read identity through the
//! `snapshot` signal, which the store's change listener keeps current, and
//! reach the store only inside hydrate-only event handlers.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::future::Future;

use leptos::prelude::*;
use session::{ChangeFeedHub, Collection, Role, SessionError, SessionSnapshot, SessionStore};

/// Session context provided by the root component.
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub snapshot: RwSignal<SessionSnapshot>,
    store: StoredValue<Option<SessionStore>, LocalStorage>,
    feed: StoredValue<Option<ChangeFeedHub>, LocalStorage>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            snapshot: RwSignal::new(SessionSnapshot::default()),
            store: StoredValue::new_local(None),
            feed: StoredValue::new_local(None),
        }
    }

    /// Bind the live store and change-feed hub, mirroring every committed
    /// store change into `snapshot`.
    pub fn attach(&self, store: SessionStore, feed: ChangeFeedHub) {
        let snapshot = self.snapshot;
        store.on_change(move |next| snapshot.set(next.clone()));
        snapshot.set(store.snapshot());
        self.store.set_value(Some(store));
        self.feed.set_value(Some(feed));
    }

    /// Give up on identity when no backend could be built.
    pub fn detach(&self) {
        self.snapshot.set(SessionSnapshot::signed_out());
    }

    /// Stop the store's background work. Safe to call after the reactive
    /// owner has started tearing down.
    pub fn dispose(&self) {
        if let Some(Some(store)) = self.store.try_get_value() {
            store.dispose();
        }
    }

    pub fn store(&self) -> Option<SessionStore> {
        self.store.get_value()
    }

    pub fn feed(&self) -> Option<ChangeFeedHub> {
        self.feed.get_value()
    }

    /// Run `action` against the store on the local executor, reporting a
    /// failure into `error`. No-op outside the browser.
    pub fn run<F, Fut>(&self, error: RwSignal<Option<String>>, action: F)
    where
        F: FnOnce(SessionStore) -> Fut + 'static,
        Fut: Future<Output = Result<(), SessionError>> + 'static,
    {
        #[cfg(feature = "hydrate")]
        {
            let Some(store) = self.store() else {
                error.set(Some("Not connected to the server.".to_owned()));
                return;
            };
            error.set(None);
            leptos::task::spawn_local(async move {
                if let Err(e) = action(store).await {
                    log::warn!("{e}");
                    error.set(Some(crate::util::errors::describe(&e)));
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (error, action);
        }
    }

    /// Bump `tick` on every change to `collection` while the calling
    /// component is mounted.
    pub fn watch(&self, collection: Collection, tick: RwSignal<u32>) {
        let Some(hub) = self.feed() else {
            return;
        };
        let subscription = hub.subscribe(collection, move |_| tick.update(|n| *n = n.wrapping_add(1)));
        // Owned by the component's reactive owner; dropped on unmount.
        let _ = StoredValue::new_local(subscription);
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn use_session() -> SessionContext {
    expect_context::<SessionContext>()
}

/// Name shown in the navigation bar.
pub fn display_name(snapshot: &SessionSnapshot) -> String {
    let Some(profile) = snapshot.profile.as_ref() else {
        return "Guest".to_owned();
    };
    if !profile.name.trim().is_empty() {
        return profile.name.clone();
    }
    profile.email.clone().unwrap_or_else(|| "Account".to_owned())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

const fn link(label: &'static str, href: &'static str) -> NavLink {
    NavLink { label, href }
}

/// Navigation entries for the signed-in role.
pub fn nav_links(snapshot: &SessionSnapshot) -> Vec<NavLink> {
    let Some(profile) = snapshot.profile.as_ref().filter(|_| snapshot.is_authenticated()) else {
        return vec![link("Home", "/"), link("Log In", "/login"), link("Register", "/register")];
    };
    match profile.role() {
        Role::Student => vec![
            link("Chat", "/chat"),
            link("Resources", "/view-resources"),
            link("Feedback", "/feedback"),
            link("Profile", "/profile"),
        ],
        Role::Admin => {
            let mut links = vec![
                link("Dashboard", "/admin-dashboard"),
                link("Manage Users", "/manage-user"),
                link("View Feedback", "/view-feedback"),
                link("Resources", "/view-resources"),
            ];
            if profile.is_super_admin() {
                links.push(link("Invite Admin", "/invite-admin"));
            }
            links
        }
    }
}
