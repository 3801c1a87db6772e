//! Client-side reactive state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Session state is provided through Leptos context from the root component
//! and consumed by route guards, the navigation bar, and pages.

pub mod auth;
