// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! memheap - Dynamic secure heap for short-lived cryptographic secrets.
//!
//! A buddy allocator whose blocks are protected page spans from
//! [`mempage`]: locked in RAM, excluded from core dumps, private to the
//! process. Freed spans are zeroized inside the allocator before they
//! re-enter the free pool, and whole blocks go back to the OS as soon as
//! coalescing reassembles them.
//!
//! The heap keeps no internal locks and is not reentrant. Callers
//! serialize access to an instance, or wrap it in their own mutual
//! exclusion.

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod bits;
mod block;
mod block_address;
mod consts;
mod free_stack;
mod heap;
mod inspector;
mod violation;

pub use block::Block;
pub use block_address::BlockAddress;
pub use consts::{MAX_EXP, MIN_EXP};
pub use free_stack::FreeStack;
pub use heap::SecureHeap;
pub use inspector::HeapInspector;
pub use violation::HeapViolation;
