//! Wall-clock access that works in the browser.
//!
//! `time`'s own clock is unavailable on `wasm32-unknown-unknown`, so hydrate
//! builds read `Date.now()` instead.

#[cfg(test)]
#[path = "clock_test.rs"]
mod clock_test;

use time::{Date, OffsetDateTime};

pub fn now() -> OffsetDateTime {
    #[cfg(feature = "hydrate")]
    {
        from_unix_millis(js_sys::Date::now())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        OffsetDateTime::now_utc()
    }
}

pub fn now_secs() -> i64 {
    now().unix_timestamp()
}

pub fn today() -> Date {
    now().date()
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn from_unix_millis(millis: f64) -> OffsetDateTime {
    let nanos = i128::from(millis as i64) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
