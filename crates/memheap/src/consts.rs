// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Size-class bounds of the allocator.

/// The minimum exponent. Every allocation occupies at least `2^MIN_EXP`
/// bytes, even if the requested size is much smaller; allocations and
/// offsets are tracked in multiples of this unit.
pub const MIN_EXP: usize = 8;

/// The maximum exponent. `2^MAX_EXP` is the largest contiguous span a user
/// can allocate. It should stay reasonably close to `MIN_EXP`, as the cost
/// of allocator operations grows with the difference.
pub const MAX_EXP: usize = 20;

/// Number of size classes managed by the heap.
pub(crate) const EXP_CLASSES: usize = MAX_EXP - MIN_EXP + 1;

/// The minimum unit: the granularity at which offsets inside a block are
/// tracked.
pub(crate) const UNIT: usize = 1 << MIN_EXP;
