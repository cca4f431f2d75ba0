// SPDX-FileCopyrightText: Copyright (c) 2025 picolink contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(feature = "std")]
pub mod client;
pub mod codec;
mod error;
mod frame;
#[cfg(feature = "std")]
pub mod server;
pub mod transport;

pub use codec::{Checksum, pack, unpack};
pub use error::*;
pub use frame::*;
