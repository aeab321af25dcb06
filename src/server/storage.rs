use super::context::Context;
use crate::consts::{DEFAULT_STORE_CAPACITY, FILLER_MAX, FILLER_MIN};
use crate::ErrorKind;
use heapless::Vec as HeaplessVec;
use rand_core::RngCore;

#[cfg(feature = "with_serde")]
use serde::{Deserialize, Serialize};

/// Fixed-capacity holding register store
///
/// `N` is the compile-time capacity, the actual register count is chosen at construction and
/// never changes afterwards. Every access is bounds-checked against the register count.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
pub struct RegisterStore<const N: usize = DEFAULT_STORE_CAPACITY> {
    holdings: HeaplessVec<u16, N>,
}

impl<const N: usize> RegisterStore<N> {
    /// Create a zero-filled store of `register_count` registers
    ///
    /// Fails with [`ErrorKind::OOB`] if the count does not fit the capacity.
    pub fn new(register_count: u16) -> Result<Self, ErrorKind> {
        let mut holdings = HeaplessVec::new();
        holdings
            .resize(usize::from(register_count), 0)
            .map_err(|_| ErrorKind::OOB)?;
        Ok(Self { holdings })
    }

    /// Create a store holding a copy of `values`
    pub fn from_slice(values: &[u16]) -> Result<Self, ErrorKind> {
        if u16::try_from(values.len()).is_err() {
            return Err(ErrorKind::OOB);
        }
        let holdings = HeaplessVec::from_slice(values).map_err(|_| ErrorKind::OOB)?;
        Ok(Self { holdings })
    }

    #[inline]
    pub const fn capacity() -> usize {
        N
    }

    pub fn read(&self, reg: u16) -> Result<u16, ErrorKind> {
        self.holdings
            .get(usize::from(reg))
            .copied()
            .ok_or(ErrorKind::OutOfRange)
    }

    pub fn write(&mut self, reg: u16, value: u16) -> Result<(), ErrorKind> {
        let cell = self
            .holdings
            .get_mut(usize::from(reg))
            .ok_or(ErrorKind::OutOfRange)?;
        *cell = value;
        Ok(())
    }

    /// Overwrite every register except `reserved` with filler in `[1, 10000)`
    ///
    /// Stands in for externally driven telemetry, the random source is supplied by the caller.
    pub fn refresh_non_reserved<R: RngCore + ?Sized>(&mut self, reserved: u16, rng: &mut R) {
        for (i, value) in self.holdings.iter_mut().enumerate() {
            if i != usize::from(reserved) {
                *value = filler_value(rng);
            }
        }
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.holdings
    }
}

impl<const N: usize> Context for RegisterStore<N> {
    fn register_count(&self) -> u16 {
        u16::try_from(self.holdings.len()).unwrap_or(u16::MAX)
    }

    #[inline]
    fn get_holding(&self, reg: u16) -> Result<u16, ErrorKind> {
        self.read(reg)
    }

    #[inline]
    fn set_holding(&mut self, reg: u16, value: u16) -> Result<(), ErrorKind> {
        self.write(reg, value)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn filler_value<R: RngCore + ?Sized>(rng: &mut R) -> u16 {
    FILLER_MIN + (rng.next_u32() % u32::from(FILLER_MAX - FILLER_MIN)) as u16
}
