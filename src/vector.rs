use crate::ErrorKind;

/// Append-only buffer the frame encoders write into
///
/// Responses are built front to back and never edited in place, so the trait only needs
/// appending, clearing and a read-only view. Fixed-capacity buffers fail with
/// [`ErrorKind::OOB`] instead of growing.
pub trait VectorTrait<T: Copy> {
    fn push(&mut self, value: T) -> Result<(), ErrorKind>;
    fn extend(&mut self, other: &[T]) -> Result<(), ErrorKind>;
    fn clear(&mut self);
    fn as_slice(&self) -> &[T];

    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

// host-side buffers for tests and demos
#[cfg(any(feature = "std", test))]
impl<T: Copy> VectorTrait<T> for Vec<T> {
    #[inline]
    fn push(&mut self, value: T) -> Result<(), ErrorKind> {
        Vec::push(self, value);
        Ok(())
    }
    #[inline]
    fn extend(&mut self, values: &[T]) -> Result<(), ErrorKind> {
        self.extend_from_slice(values);
        Ok(())
    }
    #[inline]
    fn clear(&mut self) {
        Vec::clear(self);
    }
    #[inline]
    fn as_slice(&self) -> &[T] {
        self
    }
}

impl<T: Copy, const N: usize> VectorTrait<T> for heapless::Vec<T, N> {
    #[inline]
    fn push(&mut self, value: T) -> Result<(), ErrorKind> {
        heapless::Vec::push(self, value).map_err(|_| ErrorKind::OOB)
    }
    #[inline]
    fn extend(&mut self, values: &[T]) -> Result<(), ErrorKind> {
        self.extend_from_slice(values).map_err(|_| ErrorKind::OOB)
    }
    #[inline]
    fn clear(&mut self) {
        heapless::Vec::clear(self);
    }
    #[inline]
    fn as_slice(&self) -> &[T] {
        self
    }
}
