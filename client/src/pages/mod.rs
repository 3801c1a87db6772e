//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns route-scoped orchestration (signals, store calls, change
//! feed subscriptions) and delegates shared chrome to `components`. Route
//! access is enforced by `ProtectedRoute` in `app`, not by the pages.

pub mod admin_dashboard;
pub mod chat;
pub mod complete_profile;
pub mod feedback;
pub mod home;
pub mod invite_admin;
pub mod login;
pub mod manage_user;
pub mod not_found;
pub mod profile;
pub mod register;
pub mod unauthorized;
pub mod update_password;
pub mod view_feedback;
pub mod view_resources;
