// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! One contiguous protected span managed by the heap.

use mempage::ProtectedRegion;

use crate::consts::{MAX_EXP, MIN_EXP, UNIT};
use crate::violation::HeapViolation;

/// One contiguous protected span of exactly `2^own_exponent` bytes.
///
/// Alongside the span the block keeps a dense side table with one entry
/// per unit: the exponent of the live allocation beginning at that unit,
/// or zero when none does. The table makes size lookup O(1) at a bounded
/// memory cost of at most `2^(MAX_EXP - MIN_EXP)` entries per block.
///
/// Dropping the block hands its span back to [`mempage`], which zeroizes
/// it before the pages are unmapped.
pub struct Block {
    region: ProtectedRegion,
    own_exponent: usize,
    ephemeral: bool,
    alloc_sizes: Vec<u8>,
}

impl Block {
    pub(crate) fn new(region: ProtectedRegion, own_exponent: usize, ephemeral: bool) -> Self {
        if own_exponent < MIN_EXP || own_exponent > MAX_EXP {
            HeapViolation::ExponentOutOfRange.abort();
        }

        let size_in_units = (1usize << own_exponent) >> MIN_EXP;
        Self {
            region,
            own_exponent,
            ephemeral,
            alloc_sizes: vec![0; size_in_units],
        }
    }

    /// Base address of the span.
    pub fn base(&self) -> usize {
        self.region.base_address()
    }

    /// The block's size exponent; the span covers `2^own_exponent` bytes.
    pub fn own_exponent(&self) -> usize {
        self.own_exponent
    }

    /// Whether the block is destroyed once it is entirely free.
    ///
    /// Blocks created on demand by `alloc` are ephemeral. Reserved blocks
    /// survive as one whole free slice instead.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    fn offset_in_units(&self, address: usize) -> usize {
        (address - self.base()) >> MIN_EXP
    }

    pub(crate) fn set_allocation_size(&mut self, address: usize, exponent: usize) {
        let unit = self.offset_in_units(address);
        self.alloc_sizes[unit] = exponent as u8;
    }

    /// Exponent of the live allocation beginning at `address`, or zero
    /// when no allocation begins there.
    pub fn allocation_size(&self, address: usize) -> usize {
        self.alloc_sizes[self.offset_in_units(address)] as usize
    }

    /// True iff `address` lies within the span and its offset from the
    /// base is a multiple of the minimum unit.
    pub fn is_valid_pointer(&self, address: usize) -> bool {
        let base = self.base();
        address >= base
            && address < base + (1 << self.own_exponent)
            && (address - base) % UNIT == 0
    }
}
