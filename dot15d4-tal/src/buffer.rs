//! Frame buffer pool.
//!
//! The TAL never owns frame memory. It allocates a receive buffer from a
//! [`BufferPool`], keeps the [`BufferHandle`] while the frame is queued and
//! frees it once the upper layer has seen the frame.

/// Handle of a buffer in a [`BufferPool`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BufferHandle(u8);

impl BufferHandle {
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

pub trait BufferPool {
    /// Allocate a buffer of at least `size` octets.
    fn alloc(&mut self, size: usize) -> Option<BufferHandle>;

    /// Return a buffer to the pool.
    fn free(&mut self, handle: BufferHandle);

    /// Access the content of an allocated buffer.
    fn buffer(&self, handle: BufferHandle) -> &[u8];

    /// Mutably access the content of an allocated buffer.
    fn buffer_mut(&mut self, handle: BufferHandle) -> &mut [u8];

    /// Number of buffers that can still be allocated.
    fn available(&self) -> usize;
}

/// A pool of `N` buffers of `SIZE` octets in a static array.
pub struct StaticPool<const N: usize, const SIZE: usize> {
    buffers: [[u8; SIZE]; N],
    used: [bool; N],
}

impl<const N: usize, const SIZE: usize> StaticPool<N, SIZE> {
    pub const fn new() -> Self {
        assert!(N <= u8::MAX as usize);
        Self {
            buffers: [[0; SIZE]; N],
            used: [false; N],
        }
    }
}

impl<const N: usize, const SIZE: usize> Default for StaticPool<N, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const SIZE: usize> BufferPool for StaticPool<N, SIZE> {
    fn alloc(&mut self, size: usize) -> Option<BufferHandle> {
        if size > SIZE {
            return None;
        }

        let index = self.used.iter().position(|used| !used)?;
        self.used[index] = true;
        Some(BufferHandle::new(index as u8))
    }

    fn free(&mut self, handle: BufferHandle) {
        if let Some(used) = self.used.get_mut(handle.index()) {
            debug_assert!(*used, "double free of buffer");
            *used = false;
        }
    }

    fn buffer(&self, handle: BufferHandle) -> &[u8] {
        &self.buffers[handle.index()]
    }

    fn buffer_mut(&mut self, handle: BufferHandle) -> &mut [u8] {
        &mut self.buffers[handle.index()]
    }

    fn available(&self) -> usize {
        self.used.iter().filter(|used| !**used).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_until_exhausted() {
        let mut pool = StaticPool::<2, 16>::new();
        assert_eq!(pool.available(), 2);
        assert!(pool.alloc(17).is_none());

        let a = pool.alloc(16).unwrap();
        let b = pool.alloc(4).unwrap();
        assert_ne!(a, b);
        assert!(pool.alloc(1).is_none());
        assert_eq!(pool.available(), 0);

        pool.buffer_mut(a)[0] = 0xaa;
        assert_eq!(pool.buffer(a)[0], 0xaa);

        pool.free(a);
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.alloc(8), Some(a));
    }
}
