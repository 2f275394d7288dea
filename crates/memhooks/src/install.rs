// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! One-shot process-wide installation of the heap behind the callbacks.

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use libc::{c_char, c_int, c_void, size_t};
use memheap::SecureHeap;

use crate::functions::SecureMemFunctions;

/// The seam to the cryptography library's registration call.
///
/// Production code implements this over the library's FFI entry point.
/// Tests implement it with a mock that captures the table and drives the
/// callbacks the way the library would.
pub trait SecureMemRegistrar {
    /// Hands the nine callbacks to the library. Returns whether the
    /// library accepted them.
    fn register(&self, functions: &SecureMemFunctions) -> bool;
}

/// Misuse of the one-shot installation.
///
/// Under `cfg(test)` the discriminant becomes the exit code, which lets
/// subprocess tests assert which check fired.
#[derive(Debug, Clone, Copy)]
pub(crate) enum InstallViolation {
    /// A second heap was installed process-wide.
    AlreadyInstalled = 20,
    /// A callback ran with no heap installed.
    HookWithoutHeap = 21,
}

impl InstallViolation {
    fn abort(self) -> ! {
        #[cfg(test)]
        std::process::exit(self as i32);

        #[cfg(not(test))]
        unsafe {
            libc::abort()
        }
    }
}

// The callbacks carry no user-data slot, so the installed heap lives in
// one process-wide pointer, written exactly once.
static PER_PROCESS_HEAP: AtomicPtr<SecureHeap> = AtomicPtr::new(ptr::null_mut());

fn require_heap() -> *mut SecureHeap {
    let heap = PER_PROCESS_HEAP.load(Ordering::Acquire);
    if heap.is_null() {
        InstallViolation::HookWithoutHeap.abort();
    }
    heap
}

unsafe extern "C" fn secure_mem_done() -> c_int {
    let heap = unsafe { &*require_heap() };
    heap.is_empty() as c_int
}

unsafe extern "C" fn secure_mem_malloc(
    size: size_t,
    _file: *const c_char,
    _line: c_int,
) -> *mut c_void {
    let heap = unsafe { &mut *require_heap() };
    heap.alloc(size) as *mut c_void
}

unsafe extern "C" fn secure_mem_zalloc(
    size: size_t,
    _file: *const c_char,
    _line: c_int,
) -> *mut c_void {
    let heap = unsafe { &mut *require_heap() };
    let mem = heap.alloc(size);
    if !mem.is_null() {
        // The heap zeroes on free; the callback contract nevertheless
        // promises zeroed memory on allocation.
        unsafe { ptr::write_bytes(mem, 0, size) };
    }
    mem as *mut c_void
}

unsafe extern "C" fn secure_mem_free(ptr: *mut c_void, _file: *const c_char, _line: c_int) {
    let heap = unsafe { &mut *require_heap() };
    heap.free(ptr as *mut u8);
}

unsafe extern "C" fn secure_mem_clear_free(
    ptr: *mut c_void,
    _len: size_t,
    _file: *const c_char,
    _line: c_int,
) {
    // The heap zeroes the whole slice on free; `len` adds nothing.
    let heap = unsafe { &mut *require_heap() };
    heap.free(ptr as *mut u8);
}

unsafe extern "C" fn secure_mem_allocated(ptr: *const c_void) -> c_int {
    let heap = unsafe { &*require_heap() };
    heap.block_address_of(ptr as *const u8).is_some() as c_int
}

unsafe extern "C" fn secure_mem_initialized() -> c_int {
    require_heap();
    1
}

unsafe extern "C" fn secure_mem_actual_size(ptr: *mut c_void) -> size_t {
    let heap = unsafe { &*require_heap() };
    heap.actual_size(ptr as *const u8)
}

unsafe extern "C" fn secure_mem_used() -> size_t {
    let heap = unsafe { &*require_heap() };
    heap.used_memory()
}

/// Installs `heap` as the process-wide secure heap and registers the nine
/// callbacks through `registrar`.
///
/// Installation is one-shot: a second call is a fatal programming error.
/// Returns whether the library accepted the registration.
pub fn activate_per_process(heap: SecureHeap, registrar: &dyn SecureMemRegistrar) -> bool {
    let heap = Box::into_raw(Box::new(heap));

    let installed = PER_PROCESS_HEAP.compare_exchange(
        ptr::null_mut(),
        heap,
        Ordering::AcqRel,
        Ordering::Acquire,
    );
    if installed.is_err() {
        InstallViolation::AlreadyInstalled.abort();
    }

    registrar.register(&SecureMemFunctions {
        done: secure_mem_done,
        malloc: secure_mem_malloc,
        zalloc: secure_mem_zalloc,
        free: secure_mem_free,
        clear_free: secure_mem_clear_free,
        allocated: secure_mem_allocated,
        initialized: secure_mem_initialized,
        actual_size: secure_mem_actual_size,
        used: secure_mem_used,
    })
}
