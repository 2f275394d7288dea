// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Bit-width helper for size classes.

/// Smallest `w` such that `2^w >= n`, for `n > 0`.
pub(crate) fn width_of_size(n: usize) -> usize {
    debug_assert_ne!(n, 0);

    if n.is_power_of_two() {
        n.trailing_zeros() as usize
    } else {
        (usize::BITS - n.leading_zeros()) as usize
    }
}
