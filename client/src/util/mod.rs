//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser/environment concerns (clock, local
//! storage) and text shaping (error messages, markdown) from page and
//! component logic to improve reuse and testability.

pub mod clock;
pub mod errors;
pub mod markdown;
pub mod storage;
