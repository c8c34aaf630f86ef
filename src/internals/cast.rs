use std::alloc::{alloc_zeroed, handle_alloc_error, Layout};

use super::c::MAXIMUM_REPARSE_DATA_BUFFER_SIZE;

const SIZE: usize = MAXIMUM_REPARSE_DATA_BUFFER_SIZE as usize;

// `REPARSE_DATA_BUFFER` starts with a `u32`; the GUID variant needs 8.
#[repr(C, align(8))]
struct Raw([u8; SIZE]);

/// A zeroed, maximum sized reparse data buffer owned by a single request.
pub struct BytesAsReparseDataBuffer {
    value: Box<Raw>,
}

impl BytesAsReparseDataBuffer {
    pub fn new() -> Self {
        const LAYOUT: Layout = Layout::new::<Raw>();
        // Allocated directly on the heap: 16 KiB is too much for `Box::new` on a
        // small stack in debug builds.
        let boxed = unsafe {
            let ptr = alloc_zeroed(LAYOUT).cast::<Raw>();
            if ptr.is_null() {
                handle_alloc_error(LAYOUT);
            }
            Box::from_raw(ptr)
        };
        Self { value: boxed }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.value.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.value.0
    }

    #[cfg_attr(not(windows), allow(dead_code))]
    pub fn capacity(&self) -> u32 {
        MAXIMUM_REPARSE_DATA_BUFFER_SIZE
    }
}
