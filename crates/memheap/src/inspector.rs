// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Read-only view of heap internals for tests.

use crate::block::Block;
use crate::block_address::BlockAddress;
use crate::heap::SecureHeap;

/// Read-only view into a heap's internal structure.
///
/// Exists so a test can reason about blocks and free slices without
/// coupling to the allocator's bookkeeping.
pub struct HeapInspector<'heap> {
    heap: &'heap SecureHeap,
}

impl<'heap> HeapInspector<'heap> {
    /// Creates an inspector borrowing `heap`.
    pub fn new(heap: &'heap SecureHeap) -> Self {
        Self { heap }
    }

    /// Current blocks, ordered by base address.
    pub fn blocks(&self) -> Vec<&'heap Block> {
        self.heap.ordered_blocks()
    }

    /// The free slices currently held for `exponent`.
    pub fn free_slices(&self, exponent: usize) -> &'heap [BlockAddress] {
        self.heap.free_slices_for(exponent)
    }
}
