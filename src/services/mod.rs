// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod clock;
pub mod refresh;
pub mod token_codec;
pub mod users;

pub use clock::{Clock, FixedClock, SystemClock};
pub use refresh::{RefreshService, RefreshSettings};
pub use token_codec::TokenCodec;
pub use users::{AnyUser, InMemoryUserDirectory, UserDirectory};
