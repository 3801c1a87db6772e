//! # client
//!
//! Leptos + WASM frontend for the MIRA student support platform.
//!
//! This crate contains pages, shared components, the reactive session
//! context, and the browser implementations of the `session` crate's
//! backend traits (HTTP auth and procedures, websocket change feed).

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: hydrate the server-rendered shell.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    leptos::mount::hydrate_body(app::App);
}
