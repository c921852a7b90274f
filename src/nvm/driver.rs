use crate::nvm::{
    NvmError,
    bus::BusArbiter,
    cache::PageCache,
    controller::NvmController,
    helpers::{WORD_SIZE, is_aligned},
    programmer::Programmer,
    types::{EraseMode, NvmRegion},
};

/// Buffered NVM driver: one page of RAM in front of word/row programmable flash.
///
/// # Const Generics
/// - `PS`: Page size in bytes, the erase granularity
/// - `RS`: Row size in bytes, the multi-word programming granularity
///
/// # Type Parameters
/// - `C`: Flash controller backend
/// - `B`: Arbiter for bus masters that must be idle while programming
///
/// The driver does no locking of its own. Only the hardware programming sequence runs in a
/// critical section; callers sharing a driver between tasks must serialize access themselves.
pub struct BufferedNvm<C, B, const PS: usize, const RS: usize>
where
    C: NvmController,
    B: BusArbiter,
{
    pub(crate) programmer: Programmer<C, B>,
    pub(crate) cache: PageCache<PS>,
    pub(crate) region: NvmRegion,
    pub(crate) erase_mode: EraseMode,
}

impl<C, B, const PS: usize, const RS: usize> core::fmt::Debug for BufferedNvm<C, B, PS, RS>
where
    C: NvmController,
    B: BusArbiter,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BufferedNvm")
            .field("region", &self.region)
            .field("bound_page", &self.cache.bound())
            .field("erase_mode", &self.erase_mode)
            .finish_non_exhaustive()
    }
}

impl<C, B, const PS: usize, const RS: usize> BufferedNvm<C, B, PS, RS>
where
    C: NvmController,
    B: BusArbiter,
{
    pub(crate) fn new(controller: C, bus: B, region: NvmRegion, erase_mode: EraseMode) -> Self {
        Self {
            programmer: Programmer::new(controller, bus),
            cache: PageCache::new(),
            region,
            erase_mode,
        }
    }

    pub fn region(&self) -> NvmRegion {
        self.region
    }

    pub fn erase_mode(&self) -> EraseMode {
        self.erase_mode
    }

    pub fn set_erase_mode(&mut self, mode: EraseMode) {
        self.erase_mode = mode;
    }

    pub fn controller(&self) -> &C {
        &self.programmer.controller
    }

    /// Direct controller access. Writes made through it bypass the page buffer.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.programmer.controller
    }

    /// Start address of the page currently held in the buffer, if any.
    pub fn bound_page(&self) -> Option<u32> {
        self.cache.bound()
    }

    /// The bound page's start address and its buffered (possibly uncommitted) contents.
    pub fn page_buffer(&self) -> Option<(u32, &[u8])> {
        self.cache
            .bound()
            .map(|page| (page, self.cache.buffer().as_slice()))
    }

    /// Returns true if the buffered page differs from flash.
    pub fn is_dirty(&mut self) -> bool {
        self.cache.is_dirty(&mut self.programmer.controller)
    }

    /// Commits the buffered page, if it changed, and releases it.
    ///
    /// Calling this again without intervening writes does nothing.
    pub fn flush(&mut self) -> Result<(), NvmError> {
        self.cache
            .flush::<C, B, RS>(&mut self.programmer, &self.region, self.erase_mode)
    }

    /// Binds the page containing `addr`, committing the current page first if needed.
    pub(crate) fn rebuffer(&mut self, addr: u32) -> Result<(), NvmError> {
        self.cache.rebuffer::<C, B, RS>(
            Some(addr),
            &mut self.programmer,
            &self.region,
            self.erase_mode,
        )
    }

    /// Erases the page starting at `addr`. Bypasses the page buffer.
    pub fn erase_page(&mut self, addr: u32) -> Result<(), NvmError> {
        if !is_aligned(addr, PS) {
            return Err(NvmError::Unaligned);
        }
        self.region.check_range(addr, PS)?;
        self.programmer.erase_page(addr)
    }

    /// Programs one word at `addr`. Bypasses the page buffer.
    pub fn write_word(&mut self, addr: u32, value: u32) -> Result<(), NvmError> {
        if !is_aligned(addr, WORD_SIZE) {
            return Err(NvmError::Unaligned);
        }
        self.region.check_range(addr, WORD_SIZE)?;
        self.programmer.program_word(addr, value)
    }

    /// Programs one row at `addr`. Bypasses the page buffer.
    pub fn write_row(&mut self, addr: u32, data: &[u8; RS]) -> Result<(), NvmError> {
        if !is_aligned(addr, RS) {
            return Err(NvmError::Unaligned);
        }
        self.region.check_range(addr, RS)?;
        self.programmer.program_row(addr, data)
    }

    /// Programs `src` at `dst` with rows where possible and words elsewhere.
    ///
    /// Bypasses the page buffer; the target must already be erased.
    pub fn copy_words(&mut self, dst: u32, src: &[u8]) -> Result<(), NvmError> {
        if !is_aligned(dst, WORD_SIZE) || src.len() % WORD_SIZE != 0 {
            return Err(NvmError::Unaligned);
        }
        self.region.check_range(dst, src.len())?;
        self.programmer.copy_words::<RS>(dst, src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvm::{
        HardwareFault,
        test_support::{Op, SIM_BASE, pattern, phys, test_nvm},
    };

    #[test]
    fn new_driver_has_nothing_bound() {
        let mut nvm = test_nvm();
        assert_eq!(nvm.bound_page(), None);
        assert_eq!(nvm.page_buffer(), None);
        assert!(!nvm.is_dirty());
        assert_eq!(nvm.erase_mode(), EraseMode::Always);
    }

    #[test]
    fn thin_wrappers_check_alignment() {
        let mut nvm = test_nvm();

        assert_eq!(nvm.erase_page(SIM_BASE + 8), Err(NvmError::Unaligned));
        assert_eq!(nvm.write_word(SIM_BASE + 2, 0), Err(NvmError::Unaligned));
        assert_eq!(
            nvm.write_row(SIM_BASE + 4, &[0; 8]),
            Err(NvmError::Unaligned)
        );
        assert_eq!(nvm.copy_words(SIM_BASE + 1, &[0; 4]), Err(NvmError::Unaligned));
        assert_eq!(nvm.copy_words(SIM_BASE, &[0; 6]), Err(NvmError::Unaligned));
        assert!(nvm.controller().ops().is_empty());
    }

    #[test]
    fn thin_wrappers_check_region() {
        let mut nvm = test_nvm();

        assert_eq!(nvm.erase_page(SIM_BASE + 64), Err(NvmError::InvalidAddress));
        assert_eq!(nvm.write_word(SIM_BASE - 4, 0), Err(NvmError::InvalidAddress));
        assert_eq!(
            nvm.write_row(SIM_BASE + 64, &[0; 8]),
            Err(NvmError::InvalidAddress)
        );
        assert_eq!(
            nvm.copy_words(SIM_BASE + 60, &[0; 8]),
            Err(NvmError::InvalidAddress)
        );
        assert!(nvm.controller().ops().is_empty());
    }

    #[test]
    fn thin_wrappers_program_flash() {
        let mut nvm = test_nvm();
        nvm.controller_mut().preload(16, &[0x00; 16]);

        nvm.erase_page(SIM_BASE + 16).unwrap();
        nvm.write_word(SIM_BASE + 16, 0xA5A5_0000).unwrap();
        nvm.write_row(SIM_BASE + 24, &pattern::<8>(0)).unwrap();

        assert_eq!(
            nvm.controller().ops(),
            &[
                Op::Erase(phys(SIM_BASE + 16)),
                Op::Word(phys(SIM_BASE + 16), 0xA5A5_0000),
                Op::Row(phys(SIM_BASE + 24)),
            ]
        );
        assert_eq!(&nvm.controller().mem()[16..20], &[0x00, 0x00, 0xA5, 0xA5]);
        assert_eq!(&nvm.controller().mem()[24..32], &pattern::<8>(0));
    }

    #[test]
    fn copy_words_spans_pages_unbuffered() {
        let mut nvm = test_nvm();
        let data = pattern::<24>(0x10);

        nvm.copy_words(SIM_BASE + 12, &data).unwrap();

        // word, row, row, word
        assert_eq!(nvm.controller().row_count(), 2);
        assert_eq!(nvm.controller().word_count(), 2);
        assert_eq!(&nvm.controller().mem()[12..36], &data);
        assert_eq!(nvm.bound_page(), None);
    }

    #[test]
    fn thin_wrapper_reports_hardware_fault() {
        let mut nvm = test_nvm();
        nvm.controller_mut().fail_after(0, HardwareFault::WriteError);

        assert_eq!(
            nvm.erase_page(SIM_BASE),
            Err(NvmError::NvmWriteFailed(HardwareFault::WriteError))
        );
    }

    #[test]
    fn flush_without_bound_page_is_noop() {
        let mut nvm = test_nvm();
        nvm.flush().unwrap();
        nvm.flush().unwrap();
        assert!(nvm.controller().ops().is_empty());
    }
}
