// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Whole seconds from `now` until `until`, floored at zero.
///
/// Compares Unix timestamps, matching the second resolution of token claims.
pub fn seconds_until(now: DateTime<Utc>, until: DateTime<Utc>) -> i64 {
    (until.timestamp() - now.timestamp()).max(0)
}
