//! Growable byte blob.
//!
//! A [`Blob`] is the unit of value stored in the cache: a length-tracked byte
//! buffer that is mutable while a response is being accumulated and treated
//! as immutable once handed to the cache. Growth is amortized doubling: a
//! request beyond the current capacity reserves `max(requested, 2 × capacity)`.
//!
//! Allocation failure aborts the process; the cache does not attempt
//! recovery.

use core::ffi::CStr;
use core::fmt;

/// An owned, length-tracked byte buffer.
///
/// # Examples
///
/// ```
/// use webcache_rs::Blob;
///
/// let mut blob = Blob::with_capacity(8);
/// blob.extend_from_slice(b"hello");
/// blob.push(b'!');
/// assert_eq!(blob.as_bytes(), b"hello!");
/// assert_eq!(blob.len(), 6);
/// ```
pub struct Blob {
    data: Vec<u8>,
}

impl Blob {
    /// Creates an empty blob with at least `initial_capacity` bytes reserved.
    ///
    /// The capacity is never zero; a request for zero reserves one byte.
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Blob {
            data: Vec::with_capacity(initial_capacity.max(1)),
        }
    }

    /// Returns the number of bytes stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no bytes have been appended.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of bytes reserved.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Returns the stored bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Appends a single byte, growing if needed.
    pub fn push(&mut self, byte: u8) {
        self.reserve_for(self.data.len() + 1);
        self.data.push(byte);
    }

    /// Appends a byte slice, growing if needed.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.reserve_for(self.data.len() + bytes.len());
        self.data.extend_from_slice(bytes);
    }

    /// Returns a NUL-terminated view of the stored bytes.
    ///
    /// Grows the capacity by one byte if there is no spare room for the
    /// sentinel; the sentinel is not counted in [`len`](Self::len). An
    /// interior NUL terminates the view early.
    pub fn as_cstr(&mut self) -> &CStr {
        let len = self.data.len();
        self.reserve_for(len + 1);
        // SAFETY: reserve_for guarantees capacity >= len + 1, so the byte one
        // past the end of the data is inside the allocation. The write lands
        // in spare capacity only; the vector's length is unchanged.
        let with_nul = unsafe {
            self.data.as_mut_ptr().add(len).write(0);
            core::slice::from_raw_parts(self.data.as_ptr(), len + 1)
        };
        CStr::from_bytes_until_nul(with_nul).expect("sentinel byte written past the data")
    }

    /// Grows so that `requested` total bytes fit, reserving at least twice
    /// the current capacity.
    fn reserve_for(&mut self, requested: usize) {
        let cap = self.data.capacity();
        if requested <= cap {
            return;
        }
        let target = requested.max(cap * 2);
        self.data.reserve_exact(target - self.data.len());
    }
}

impl Clone for Blob {
    /// Produces an independent copy whose capacity equals the source length.
    ///
    /// Mutating the copy never affects the original; this is what insulates
    /// a cache lookup's caller from concurrent eviction.
    fn clone(&self) -> Self {
        let mut copy = Blob::with_capacity(self.len());
        copy.extend_from_slice(self.as_bytes());
        copy
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("length", &self.data.len())
            .field("capacity", &self.data.capacity())
            .finish()
    }
}
