// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! mempage - Protected page spans for secret storage.
//!
//! Reserves anonymous, process-private memory, locks it in RAM to keep it
//! off the swap device, and excludes it from core dumps where the OS
//! supports that. Spans are zeroized before their pages go back to the OS.

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod error;
mod region;

pub use error::RegionError;
pub use region::{page_size_exponent, ProtectedRegion};
