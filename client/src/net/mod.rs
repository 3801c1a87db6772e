//! Networking modules for the hosted backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `config` resolves where the backend lives, `supabase` implements the
//! identity provider and edge-function contracts over HTTP, and `realtime`
//! implements the change feed over the Phoenix-channel websocket.

pub mod config;
pub mod realtime;
pub mod supabase;
