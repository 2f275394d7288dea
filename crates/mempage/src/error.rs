// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for mempage.

use thiserror::Error;

/// Errors from reserving a protected span.
///
/// Every variant is a soft failure: the caller is expected to treat the
/// span as unavailable, not to crash.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RegionError {
    /// The kernel refused to map anonymous pages.
    #[error("failed to map anonymous pages")]
    Map,

    /// The kernel refused to lock the span into memory.
    #[error("failed to lock pages into memory")]
    Lock,

    /// The kernel rejected the no-dump advisory.
    #[error("failed to exclude pages from core dumps")]
    DontDump,
}
