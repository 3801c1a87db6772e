//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components render shared chrome (navigation, route guarding, banners,
//! pagination) while reading session state from Leptos context providers.

pub mod confirm_delete;
pub mod nav_bar;
pub mod protected_route;
pub mod status;
