use crate::{ErrorKind, VectorTrait};

/// Holding register access
///
/// Implementors provide single-register get/set with their own bounds check, the bulk helpers
/// validate the whole range before touching anything, so a failed call never leaves a partial
/// result behind.
pub trait Context {
    /// Number of addressable holding registers
    fn register_count(&self) -> u16;

    /// Get a single holding
    fn get_holding(&self, reg: u16) -> Result<u16, ErrorKind>;

    /// Set a single holding
    fn set_holding(&mut self, reg: u16, value: u16) -> Result<(), ErrorKind>;

    /// Make sure `reg..reg + count` is inside the store
    fn check_range(&self, reg: u16, count: u16) -> Result<(), ErrorKind> {
        if u32::from(reg) + u32::from(count) > u32::from(self.register_count()) {
            Err(ErrorKind::OutOfRange)
        } else {
            Ok(())
        }
    }

    /// Get holdings as Vec of u8 (big-endian, 2 bytes per register)
    ///
    /// Note: Vec is always appended
    fn get_holdings_as_u8<V: VectorTrait<u8>>(
        &self,
        reg: u16,
        count: u16,
        result: &mut V,
    ) -> Result<(), ErrorKind> {
        self.check_range(reg, count)?;
        for i in reg..reg + count {
            result.extend(&self.get_holding(i)?.to_be_bytes())?;
        }
        Ok(())
    }

    /// Bulk set holdings
    fn set_holdings_bulk(&mut self, reg: u16, values: &[u16]) -> Result<(), ErrorKind> {
        let count = u16::try_from(values.len()).map_err(|_| ErrorKind::OutOfRange)?;
        self.check_range(reg, count)?;
        for (i, value) in (reg..reg + count).zip(values) {
            self.set_holding(i, *value)?;
        }
        Ok(())
    }
}
