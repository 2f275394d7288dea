// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! ProtectedRegion - an owned span of locked, no-dump, private pages.
//!
//! Wraps one mmap'd span with mlock and the core-dump advisory applied.
//! Release always covers the whole span; partial release does not exist.

use core::ptr;
use core::slice;
use core::sync::atomic::{AtomicUsize, Ordering};

use zeroize::Zeroize;

use crate::error::RegionError;

/// An owned span of protected pages.
///
/// The span is readable and writable, locked in RAM, excluded from core
/// dumps where the OS supports it, and private to the process. Dropping
/// the region zeroizes the span before its pages are unmapped.
#[derive(Debug)]
pub struct ProtectedRegion {
    ptr: *mut u8,
    size: usize,
}

// Safety: the region owns its mapping; nothing else aliases it.
unsafe impl Send for ProtectedRegion {}

impl ProtectedRegion {
    /// Reserves `size` bytes of protected memory.
    ///
    /// `size` must be a power of two that is also a multiple of the page
    /// size; the returned base is page-aligned. Failure to map, lock or
    /// mark the span is reported as a soft [`RegionError`].
    pub fn reserve(size: usize) -> Result<Self, RegionError> {
        debug_assert!(size.is_power_of_two());
        debug_assert_eq!(size & ((1 << page_size_exponent()) - 1), 0);

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(RegionError::Map);
        }

        // Error paths below drop `region`, which unmaps the span.
        let region = Self {
            ptr: ptr as *mut u8,
            size,
        };

        if unsafe { libc::mlock(region.ptr as *const _, region.size) } != 0 {
            return Err(RegionError::Lock);
        }

        region.dontdump()?;

        Ok(region)
    }

    /// Base address of the span.
    pub fn base(&self) -> *mut u8 {
        self.ptr
    }

    /// Base address of the span as an integer.
    pub fn base_address(&self) -> usize {
        self.ptr as usize
    }

    /// Size of the span in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    #[cfg(target_os = "linux")]
    fn dontdump(&self) -> Result<(), RegionError> {
        let failed =
            unsafe { libc::madvise(self.ptr as *mut _, self.size, libc::MADV_DONTDUMP) } != 0;

        if failed {
            return Err(RegionError::DontDump);
        }

        Ok(())
    }

    // The advisory does not exist outside Linux.
    #[cfg(not(target_os = "linux"))]
    fn dontdump(&self) -> Result<(), RegionError> {
        Ok(())
    }

    fn zeroize_span(&mut self) {
        let span = unsafe { slice::from_raw_parts_mut(self.ptr, self.size) };
        span.zeroize();
    }

    fn munlock(&self) {
        unsafe { libc::munlock(self.ptr as *const _, self.size) };
    }

    fn munmap(&self) {
        unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.size) };
    }
}

impl Drop for ProtectedRegion {
    fn drop(&mut self) {
        self.zeroize_span();
        self.munlock();
        self.munmap();
    }
}

static PAGE_SIZE_EXPONENT: AtomicUsize = AtomicUsize::new(0);

/// Exponent of the system page size (the page size is `1 << exponent`).
///
/// Discovered once via `sysconf` and cached. A page size that is not a
/// power of two has no representable exponent; such a platform cannot back
/// the allocator, so the process aborts.
pub fn page_size_exponent() -> usize {
    let cached = PAGE_SIZE_EXPONENT.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    if !page_size.is_power_of_two() {
        unsafe { libc::abort() };
    }

    let exponent = page_size.trailing_zeros() as usize;
    PAGE_SIZE_EXPONENT.store(exponent, Ordering::Relaxed);
    exponent
}
