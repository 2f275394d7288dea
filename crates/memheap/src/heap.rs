// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The secure heap: blocks, free stacks, alloc/free orchestration.

use core::ptr;
use core::slice;
use std::collections::BTreeMap;

use mempage::{page_size_exponent, ProtectedRegion};
use zeroize::Zeroize;

use crate::bits::width_of_size;
use crate::block::Block;
use crate::block_address::BlockAddress;
use crate::consts::{EXP_CLASSES, MAX_EXP, MIN_EXP};
use crate::free_stack::FreeStack;
use crate::violation::HeapViolation;

/// A dynamic heap backed by locked, no-dump, process-private pages.
///
/// Blocks are split and merged along an implicit buddy tree: the sibling
/// and parent of a slice are derived from its offset, never stored. Each
/// size class between [`MIN_EXP`] and [`MAX_EXP`] keeps its own stack of
/// free slices, and an ordered map from base address to block answers the
/// "is this pointer ours?" question.
///
/// The heap is not reentrant and keeps no internal locks; callers
/// serialize access.
pub struct SecureHeap {
    base_addresses: BTreeMap<usize, Block>,
    free_slices: [FreeStack; EXP_CLASSES],
}

impl SecureHeap {
    /// Creates an empty heap. No pages are reserved until the first
    /// allocation or an explicit reservation.
    pub fn new() -> Self {
        Self {
            base_addresses: BTreeMap::new(),
            free_slices: core::array::from_fn(|_| FreeStack::new()),
        }
    }

    /// Allocates `size` bytes of protected memory.
    ///
    /// Returns null when `size` is zero (the pointer only needs to be
    /// valid for zero bytes), when `size` exceeds `2^MAX_EXP`, or when
    /// the OS refuses to reserve further protected pages.
    pub fn alloc(&mut self, size: usize) -> *mut u8 {
        if size == 0 {
            return ptr::null_mut();
        }

        let exponent = width_of_size(size).max(MIN_EXP);
        let mut addr = self.alloc_exponent(exponent);

        if addr.is_none() && exponent <= MAX_EXP {
            // No existing block can cover the request. Create one; the
            // retry must then succeed, since the new block contributes a
            // free slice at its own exponent.
            if self.create_block(exponent, true) {
                addr = self.alloc_exponent(exponent);
                if addr.is_none() {
                    HeapViolation::FreshBlockExhausted.abort();
                }
            }
        }

        match addr {
            Some(addr) => {
                self.block_mut(addr.block_base())
                    .set_allocation_size(addr.address(), exponent);
                addr.address() as *mut u8
            }
            None => ptr::null_mut(),
        }
    }

    fn alloc_exponent(&mut self, exponent: usize) -> Option<BlockAddress> {
        if exponent > MAX_EXP {
            return None;
        }

        if let Some(addr) = self.stack_mut(exponent).pop() {
            return Some(addr);
        }

        // Take a slice of twice the size, recursively, and split it: the
        // lower half is handed out, the upper half becomes the free buddy.
        let addr = self.alloc_exponent(exponent + 1)?;
        self.stack_mut(exponent).push(addr.buddy(exponent));
        Some(addr)
    }

    /// Returns an allocation to the heap.
    ///
    /// The freed span is zeroized before it re-enters the free pool, then
    /// merged with its free buddies as far as possible. An ephemeral
    /// block whose whole span becomes free is released back to the OS.
    /// `free(null)` is a no-op.
    ///
    /// Passing a pointer the heap does not own, or freeing the same
    /// pointer twice, is a fatal programming error.
    pub fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        let address = ptr as usize;
        let mut addr = match self.block_address_of(ptr) {
            Some(addr) => addr,
            None => HeapViolation::InvalidFree.abort(),
        };

        let base = addr.block_base();
        let own_exponent = self.block(base).own_exponent();

        let mut exponent = self.block(base).allocation_size(address);
        if exponent == 0 {
            HeapViolation::DoubleFree.abort();
        }

        // Clearing the entry first makes a second free of the same
        // pointer detectable.
        self.block_mut(base).set_allocation_size(address, 0);

        // Zeroize before any merge, so a partially merged slice never
        // holds stale plaintext when it is handed out again.
        unsafe { slice::from_raw_parts_mut(ptr, 1 << exponent) }.zeroize();

        // Merge with the free buddy, one level at a time, until the
        // sibling is busy or the block is whole. The buddy at the block's
        // own exponent does not exist and is never computed.
        while exponent < own_exponent {
            let buddy = addr.buddy(exponent);
            if !self.stack_mut(exponent).remove(&buddy) {
                break;
            }
            addr = addr.parent(exponent);
            exponent += 1;
        }

        if exponent == own_exponent && self.block(base).is_ephemeral() {
            self.destroy_block(base);
        } else {
            self.stack_mut(exponent).push(addr);
        }
    }

    /// Looks up the block owning `ptr`.
    ///
    /// Returns the unique block whose span contains `ptr`, provided `ptr`
    /// is unit-aligned within it. This is the check hosts use to decide
    /// whether a free is routed here or to the system allocator.
    pub fn block_address_of(&self, ptr: *const u8) -> Option<BlockAddress> {
        let address = ptr as usize;
        let (_, block) = self.base_addresses.range(..=address).next_back()?;

        if block.is_valid_pointer(address) {
            Some(BlockAddress::new(block.base(), address))
        } else {
            None
        }
    }

    /// Size of the live allocation behind `ptr`: `2^exponent` as recorded
    /// when it was allocated, or zero when `ptr` is not a live allocation
    /// of this heap.
    pub fn actual_size(&self, ptr: *const u8) -> usize {
        match self.block_address_of(ptr) {
            Some(addr) => {
                let exponent = self.block(addr.block_base()).allocation_size(addr.address());
                if exponent == 0 {
                    0
                } else {
                    1 << exponent
                }
            }
            None => 0,
        }
    }

    /// Bytes currently allocated to users, counted in whole size classes.
    ///
    /// Computed as total block memory minus free-slice memory. The heap
    /// is not expected to report this often enough to justify tracking
    /// used memory incrementally at the cost of the hot paths.
    pub fn used_memory(&self) -> usize {
        let total: usize = self
            .base_addresses
            .values()
            .map(|block| 1 << block.own_exponent())
            .sum();

        let unused: usize = (MIN_EXP..=MAX_EXP)
            .map(|exponent| self.stack(exponent).height() << exponent)
            .sum();

        debug_assert!(unused <= total);
        total - unused
    }

    /// True when the heap holds no blocks at all.
    pub fn is_empty(&self) -> bool {
        self.base_addresses.is_empty()
    }

    /// Reserves a block that is not destroyed when it becomes entirely
    /// free, sized to hold at least `2^min_exponent` bytes.
    ///
    /// Lets a host pre-reserve protected memory before any secret flows
    /// through the heap. Returns whether the reservation succeeded.
    pub fn create_reserved_block(&mut self, min_exponent: usize) -> bool {
        self.create_block(min_exponent, false)
    }

    fn create_block(&mut self, min_exponent: usize, ephemeral: bool) -> bool {
        if min_exponent < MIN_EXP || min_exponent > MAX_EXP {
            HeapViolation::ExponentOutOfRange.abort();
        }

        // The page is the smallest span the kernel hands out without
        // waste. Small pages (<= 4 KiB) get 16-page blocks, larger pages
        // 8-page blocks: few large blocks keep the per-block side table
        // and map entry amortized.
        let page_exponent = page_size_exponent();
        let page_multiplier = if page_exponent <= 12 { 4 } else { 3 };

        let desired_exponent = MAX_EXP.min(page_exponent + page_multiplier);
        let block_exponent = min_exponent.max(desired_exponent);

        let region = match ProtectedRegion::reserve(1 << block_exponent) {
            Ok(region) => region,
            Err(_) => return false,
        };

        let block = Block::new(region, block_exponent, ephemeral);
        let base = block.base();
        self.stack_mut(block_exponent)
            .push(BlockAddress::new(base, base));
        self.base_addresses.insert(base, block);

        true
    }

    fn destroy_block(&mut self, base: usize) {
        // Dropping the block zeroizes, unlocks and unmaps its span.
        if self.base_addresses.remove(&base).is_none() {
            HeapViolation::UnknownBlock.abort();
        }
    }

    fn block(&self, base: usize) -> &Block {
        match self.base_addresses.get(&base) {
            Some(block) => block,
            None => HeapViolation::UnknownBlock.abort(),
        }
    }

    fn block_mut(&mut self, base: usize) -> &mut Block {
        match self.base_addresses.get_mut(&base) {
            Some(block) => block,
            None => HeapViolation::UnknownBlock.abort(),
        }
    }

    fn stack(&self, exponent: usize) -> &FreeStack {
        &self.free_slices[exponent - MIN_EXP]
    }

    fn stack_mut(&mut self, exponent: usize) -> &mut FreeStack {
        &mut self.free_slices[exponent - MIN_EXP]
    }

    pub(crate) fn ordered_blocks(&self) -> Vec<&Block> {
        self.base_addresses.values().collect()
    }

    pub(crate) fn free_slices_for(&self, exponent: usize) -> &[BlockAddress] {
        self.stack(exponent).slices()
    }
}

impl Default for SecureHeap {
    fn default() -> Self {
        Self::new()
    }
}
