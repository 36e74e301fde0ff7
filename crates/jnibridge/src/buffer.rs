//! Argument and region buffers
//!
//! By default the VM reads argument slots and array regions straight out of
//! host memory; calls are synchronous and the VM does not keep the pointer.
//! With the `copy-args` feature every buffer is first copied into memory from
//! the C allocator and freed once the call returns.

use jnibridge_sdk::JValue;

/// Packed `jvalue` slots for one call
pub struct ArgBuffer {
    #[cfg(not(feature = "copy-args"))]
    slots: Vec<JValue>,
    #[cfg(feature = "copy-args")]
    slots: foreign::ForeignBuffer<JValue>,
}

impl ArgBuffer {
    pub fn from_slots(slots: Vec<JValue>) -> Self {
        #[cfg(feature = "copy-args")]
        let slots = foreign::ForeignBuffer::copy_from(&slots);
        ArgBuffer { slots }
    }

    pub fn as_slice(&self) -> &[JValue] {
        #[cfg(not(feature = "copy-args"))]
        {
            &self.slots
        }
        #[cfg(feature = "copy-args")]
        {
            self.slots.as_slice()
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run `f` over a region buffer laid out according to the build policy
pub(crate) fn with_region<T: Copy, R>(data: &[T], f: impl FnOnce(&[T]) -> R) -> R {
    #[cfg(feature = "copy-args")]
    {
        let copy = foreign::ForeignBuffer::copy_from(data);
        f(copy.as_slice())
    }
    #[cfg(not(feature = "copy-args"))]
    {
        f(data)
    }
}

#[cfg(feature = "copy-args")]
mod foreign {
    use std::alloc::{handle_alloc_error, Layout};
    use std::ptr::NonNull;

    /// A copy of a slice in `malloc`ed memory, freed on drop
    pub struct ForeignBuffer<T: Copy> {
        ptr: NonNull<T>,
        len: usize,
    }

    impl<T: Copy> ForeignBuffer<T> {
        pub fn copy_from(data: &[T]) -> Self {
            let layout = Layout::array::<T>(data.len().max(1)).unwrap_or_else(|_| Layout::new::<T>());
            // SAFETY: the size is non-zero; a null return is handled below.
            let raw = unsafe { libc::malloc(layout.size()) } as *mut T;
            let Some(ptr) = NonNull::new(raw) else {
                handle_alloc_error(layout);
            };
            // SAFETY: `ptr` has room for `data.len()` elements and does not
            // overlap `data`.
            unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.as_ptr(), data.len()) };
            ForeignBuffer {
                ptr,
                len: data.len(),
            }
        }

        pub fn as_slice(&self) -> &[T] {
            // SAFETY: `len` elements were initialized in `copy_from`.
            unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
        }
    }

    impl<T: Copy> Drop for ForeignBuffer<T> {
        fn drop(&mut self) {
            // SAFETY: allocated with `libc::malloc` and freed exactly once.
            unsafe { libc::free(self.ptr.as_ptr().cast()) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_buffer_keeps_slots() {
        let buffer = ArgBuffer::from_slots(vec![JValue { i: 7 }, JValue { j: -1 }]);
        assert_eq!(buffer.len(), 2);
        assert_eq!(unsafe { buffer.as_slice()[0].i }, 7);
        assert_eq!(unsafe { buffer.as_slice()[1].j }, -1);
    }

    #[test]
    fn test_empty_buffers() {
        assert!(ArgBuffer::from_slots(Vec::new()).is_empty());
        let n = with_region::<i32, usize>(&[], |s| s.len());
        assert_eq!(n, 0);
    }

    #[test]
    fn test_region_contents() {
        let sum = with_region(&[1i64, 2, 3], |s| s.iter().sum::<i64>());
        assert_eq!(sum, 6);
    }
}
