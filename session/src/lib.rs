//! # session
//!
//! Session and authorization core for the MIRA student support client.
//!
//! The crate owns "who is signed in, and what may they see": the
//! [`store::SessionStore`] caches the provider session and the typed
//! [`profile::UserProfile`], [`guard`] turns that state into a
//! render-or-redirect decision per route, and [`feed::ChangeFeedHub`] fans
//! realtime change notifications out to mounted views.
//!
//! SYSTEM CONTEXT
//! ==============
//! All durable logic lives in a hosted backend. This crate only talks to it
//! through the collaborator traits in [`backend`], so the browser client
//! plugs in HTTP/websocket implementations and tests plug in mocks.

pub mod backend;
pub mod config;
pub mod error;
pub mod feed;
pub mod guard;
pub mod procedures;
pub mod profile;
pub mod role;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{AuthClient, ChangeFeedClient, Collection, Credentials, RemoteProcedureClient, Session};
pub use config::SessionConfig;
pub use error::{ErrorCode, SessionError};
pub use feed::{ChangeFeedHub, FeedSubscription};
pub use guard::GuardDecision;
pub use profile::UserProfile;
pub use role::{Role, RouteAccess};
pub use store::{SessionPhase, SessionSnapshot, SessionStore, SignInOutcome, VerificationRequired};
