// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The callback table in the shape the cryptography library expects.
//!
//! Sizes travel as `size_t`, pointers are opaque, and three callbacks
//! accept a trailing (file, line) debug pair that the heap ignores.

use libc::{c_char, c_int, c_void, size_t};

/// Reports whether the heap released everything; zero means allocations
/// are still outstanding.
pub type DoneFn = unsafe extern "C" fn() -> c_int;

/// Allocates `size` bytes of protected memory, or returns null.
pub type MallocFn =
    unsafe extern "C" fn(size: size_t, file: *const c_char, line: c_int) -> *mut c_void;

/// Like [`MallocFn`], additionally zeroing the first `size` bytes.
pub type ZallocFn =
    unsafe extern "C" fn(size: size_t, file: *const c_char, line: c_int) -> *mut c_void;

/// Returns an allocation to the heap.
pub type FreeFn = unsafe extern "C" fn(ptr: *mut c_void, file: *const c_char, line: c_int);

/// Like [`FreeFn`], with the caller's idea of the allocation length; the
/// heap zeroes the whole backing slice regardless.
pub type ClearFreeFn =
    unsafe extern "C" fn(ptr: *mut c_void, len: size_t, file: *const c_char, line: c_int);

/// Whether `ptr` belongs to the secure heap.
pub type AllocatedFn = unsafe extern "C" fn(ptr: *const c_void) -> c_int;

/// Whether the secure-memory interface is ready.
pub type InitializedFn = unsafe extern "C" fn() -> c_int;

/// Size of the class actually backing `ptr`, or zero when `ptr` is not a
/// live allocation of the heap.
pub type ActualSizeFn = unsafe extern "C" fn(ptr: *mut c_void) -> size_t;

/// Bytes currently allocated through the interface.
pub type UsedFn = unsafe extern "C" fn() -> size_t;

/// The nine callbacks handed to the cryptography library's registration
/// call.
#[derive(Debug, Clone, Copy)]
pub struct SecureMemFunctions {
    /// Cleanup check, called when the library tears the interface down.
    pub done: DoneFn,
    /// Protected allocation.
    pub malloc: MallocFn,
    /// Protected allocation, zeroed.
    pub zalloc: ZallocFn,
    /// Release of a protected allocation.
    pub free: FreeFn,
    /// Release with explicit wipe semantics.
    pub clear_free: ClearFreeFn,
    /// Ownership query.
    pub allocated: AllocatedFn,
    /// Readiness query.
    pub initialized: InitializedFn,
    /// Backing-size query.
    pub actual_size: ActualSizeFn,
    /// Usage accounting query.
    pub used: UsedFn,
}
