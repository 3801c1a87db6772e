//! Browser `localStorage` helpers for the persisted auth session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Hydrate-only read/write/remove behavior lives here so the backend client
//! does not repeat web-sys glue. SSR and native test builds no-op.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Load a JSON value stored under `key`. Corrupt entries read as absent.
pub fn load_json<T: DeserializeOwned>(key: &str) -> Option<T> {
    #[cfg(feature = "hydrate")]
    {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
        let raw = storage.get_item(key).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = key;
        None
    }
}

/// Save a JSON value under `key`, or remove the entry for `None`.
pub fn save_json<T: Serialize>(key: &str, value: Option<&T>) {
    #[cfg(feature = "hydrate")]
    {
        let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) else {
            return;
        };
        let Some(value) = value else {
            let _ = storage.remove_item(key);
            return;
        };
        match serde_json::to_string(value) {
            Ok(raw) => {
                if storage.set_item(key, &raw).is_err() {
                    log::warn!("localStorage write failed for {key}");
                }
            }
            Err(e) => log::warn!("could not serialize {key}: {e}"),
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (key, value);
    }
}
