use crate::nvm::{
    NvmError,
    bus::BusArbiter,
    controller::NvmController,
    helpers::page_start,
    programmer::Programmer,
    types::{EraseMode, NvmRegion},
};

/// Bytes compared per read when checking the buffer against flash.
const COMPARE_CHUNK: usize = 32;

/// Single-entry write-back cache holding one flash page in RAM.
///
/// While a page is bound, `buffer` holds its intended contents; flash may lag behind until
/// the page is committed. There is no dirty flag: a bound page is dirty iff its buffer differs
/// from flash.
pub(crate) struct PageCache<const PS: usize> {
    buffer: [u8; PS],
    bound: Option<u32>,
}

impl<const PS: usize> PageCache<PS> {
    pub(crate) const fn new() -> Self {
        Self {
            buffer: [0; PS],
            bound: None,
        }
    }

    /// Start address of the bound page, if any.
    #[inline]
    pub(crate) fn bound(&self) -> Option<u32> {
        self.bound
    }

    #[inline]
    pub(crate) fn buffer(&self) -> &[u8; PS] {
        &self.buffer
    }

    #[inline]
    pub(crate) fn buffer_mut(&mut self) -> &mut [u8; PS] {
        &mut self.buffer
    }

    /// Makes the page containing `target` the bound page, committing the current one first.
    ///
    /// With `target == None` the current page is committed and the cache is left unbound.
    /// A failed commit leaves both the binding and the buffer untouched so it can be retried.
    pub(crate) fn rebuffer<C, B, const RS: usize>(
        &mut self,
        target: Option<u32>,
        programmer: &mut Programmer<C, B>,
        region: &NvmRegion,
        erase_mode: EraseMode,
    ) -> Result<(), NvmError>
    where
        C: NvmController,
        B: BusArbiter,
    {
        if let Some(addr) = target {
            if !region.contains(addr) {
                return Err(NvmError::InvalidAddress);
            }
            if self.bound == Some(page_start::<PS>(addr)) {
                return Ok(());
            }
        }

        if let Some(page) = self.bound {
            self.commit::<C, B, RS>(page, programmer, erase_mode)?;
        }

        match target {
            Some(addr) => {
                let page = page_start::<PS>(addr);
                programmer.controller.read(page, &mut self.buffer);
                self.bound = Some(page);
                log::debug!("bound page {:#010x}", page);
            }
            None => self.bound = None,
        }

        Ok(())
    }

    /// Commits the bound page and unbinds it.
    pub(crate) fn flush<C, B, const RS: usize>(
        &mut self,
        programmer: &mut Programmer<C, B>,
        region: &NvmRegion,
        erase_mode: EraseMode,
    ) -> Result<(), NvmError>
    where
        C: NvmController,
        B: BusArbiter,
    {
        self.rebuffer::<C, B, RS>(None, programmer, region, erase_mode)
    }

    /// Returns true if a page is bound and its buffer differs from flash.
    pub(crate) fn is_dirty<C: NvmController>(&self, controller: &mut C) -> bool {
        match self.bound {
            Some(page) => !self.matches_flash(page, controller),
            None => false,
        }
    }

    fn commit<C, B, const RS: usize>(
        &self,
        page: u32,
        programmer: &mut Programmer<C, B>,
        erase_mode: EraseMode,
    ) -> Result<(), NvmError>
    where
        C: NvmController,
        B: BusArbiter,
    {
        if self.matches_flash(page, &mut programmer.controller) {
            log::trace!("page {:#010x} clean, nothing to commit", page);
            return Ok(());
        }

        let erase = match erase_mode {
            EraseMode::Always => true,
            EraseMode::WhenRequired => self.needs_erase(page, &mut programmer.controller),
        };

        critical_section::with(|_| {
            if erase {
                programmer.erase_page(page)?;
            }
            programmer.copy_words::<RS>(page, &self.buffer)
        })?;

        log::debug!("committed page {:#010x} (erased: {})", page, erase);
        Ok(())
    }

    fn matches_flash<C: NvmController>(&self, page: u32, controller: &mut C) -> bool {
        let mut chunk = [0u8; COMPARE_CHUNK];
        let mut addr = page;
        for wanted in self.buffer.chunks(COMPARE_CHUNK) {
            let flash = &mut chunk[..wanted.len()];
            controller.read(addr, flash);
            if flash != wanted {
                return false;
            }
            addr += wanted.len() as u32;
        }
        true
    }

    /// Returns true if some bit that is clear in flash must be set, which only an erase can do.
    fn needs_erase<C: NvmController>(&self, page: u32, controller: &mut C) -> bool {
        let mut chunk = [0u8; COMPARE_CHUNK];
        let mut addr = page;
        for wanted in self.buffer.chunks(COMPARE_CHUNK) {
            let flash = &mut chunk[..wanted.len()];
            controller.read(addr, flash);
            if flash.iter().zip(wanted).any(|(f, w)| !f & w != 0) {
                return true;
            }
            addr += wanted.len() as u32;
        }
        false
    }
}
