// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Addresses of slices inside a block.

/// Identifies one slice inside a block: the owning block's base address
/// paired with the slice's own address.
///
/// Two values are equal only when both parts match. Blocks never share a
/// base address, so the pair is a complete identity even when spans from
/// different blocks could alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAddress {
    block_base: usize,
    address: usize,
}

impl BlockAddress {
    pub(crate) fn new(block_base: usize, address: usize) -> Self {
        debug_assert!(address >= block_base);
        Self {
            block_base,
            address,
        }
    }

    /// Base address of the owning block.
    pub fn block_base(&self) -> usize {
        self.block_base
    }

    /// Address of the slice itself.
    pub fn address(&self) -> usize {
        self.address
    }

    fn offset(&self) -> usize {
        self.address - self.block_base
    }

    /// The sibling slice of size `2^exponent` that together with this one
    /// forms a parent slice of size `2^(exponent + 1)`: flips bit
    /// `exponent` of the offset.
    pub fn buddy(&self, exponent: usize) -> BlockAddress {
        let their_offset = self.offset() ^ (1 << exponent);
        BlockAddress::new(self.block_base, self.block_base + their_offset)
    }

    /// Base of the containing slice of size `2^(exponent + 1)`: clears bit
    /// `exponent` of the offset.
    pub fn parent(&self, exponent: usize) -> BlockAddress {
        let offset = self.offset();
        let buddy_offset = offset ^ (1 << exponent);
        BlockAddress::new(self.block_base, self.block_base + (offset & buddy_offset))
    }
}
