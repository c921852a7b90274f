use core::marker::PhantomData;

use crate::nvm::{
    bus::{BusArbiter, NoBusArbiter},
    controller::NvmController,
    driver::BufferedNvm,
    helpers::{WORD_SIZE, is_aligned},
    types::{EraseMode, NvmRegion},
};

// Builder states
pub struct NeedPageSize;
pub struct NeedRowSize;
pub struct NeedRegion;
pub struct NeedController;
pub struct NeedBusArbiter;
pub struct Ready;

/// Typestate builder for [`BufferedNvm`].
///
/// ```rust,ignore
/// let nvm = BufferedNvmBuilder::new()
///     .page_size::<4096>()
///     .row_size::<128>()
///     .region(NvmRegion::new(0x9D00_0000, 512 * 1024))
///     .controller(controller)
///     .default_bus()
///     .build();
/// ```
pub struct BufferedNvmBuilder<const PS: usize, const RS: usize, C, B, State> {
    region: NvmRegion,
    controller: C,
    bus: B,
    erase_mode: EraseMode,
    _phantom: PhantomData<State>,
}

// Start the builder
impl BufferedNvmBuilder<0, 0, (), (), NeedPageSize> {
    pub fn new() -> Self {
        BufferedNvmBuilder {
            region: NvmRegion::new(0, 0),
            controller: (),
            bus: (),
            erase_mode: EraseMode::default(),
            _phantom: PhantomData,
        }
    }

    /// Set the page (erase unit) size in bytes.
    pub fn page_size<const PS: usize>(self) -> BufferedNvmBuilder<PS, 0, (), (), NeedRowSize> {
        BufferedNvmBuilder {
            region: NvmRegion::new(0, 0),
            controller: (),
            bus: (),
            erase_mode: self.erase_mode,
            _phantom: PhantomData,
        }
    }
}

impl Default for BufferedNvmBuilder<0, 0, (), (), NeedPageSize> {
    fn default() -> Self {
        Self::new()
    }
}

// Set row size
impl<const PS: usize> BufferedNvmBuilder<PS, 0, (), (), NeedRowSize> {
    /// Set the row (multi-word programming unit) size in bytes.
    ///
    /// # Panics
    /// Panics if the row size is not a non-zero multiple of the word size, or the page size
    /// is not a multiple of the row size.
    pub fn row_size<const RS: usize>(self) -> BufferedNvmBuilder<PS, RS, (), (), NeedRegion> {
        assert!(
            RS > 0 && RS % WORD_SIZE == 0,
            "Row size {} is not a multiple of the word size {}",
            RS,
            WORD_SIZE
        );
        assert!(
            PS > 0 && PS % RS == 0,
            "Page size {} is not a multiple of row size {}",
            PS,
            RS
        );

        BufferedNvmBuilder {
            region: NvmRegion::new(0, 0),
            controller: (),
            bus: (),
            erase_mode: self.erase_mode,
            _phantom: PhantomData,
        }
    }
}

// Set region
impl<const PS: usize, const RS: usize> BufferedNvmBuilder<PS, RS, (), (), NeedRegion> {
    /// Set the programmable address range.
    ///
    /// # Panics
    /// Panics if the region is empty, not page aligned, not a whole number of pages, or
    /// extends past the end of the address space.
    pub fn region(self, region: NvmRegion) -> BufferedNvmBuilder<PS, RS, (), (), NeedController> {
        assert!(!region.is_empty(), "NVM region is empty");
        assert!(
            is_aligned(region.base(), PS) && is_aligned(region.len(), PS),
            "NVM region {:#010x}+{:#x} is not aligned to page size {}",
            region.base(),
            region.len(),
            PS
        );
        assert!(
            region.base().checked_add(region.len()).is_some(),
            "NVM region {:#010x}+{:#x} overflows the address space",
            region.base(),
            region.len()
        );

        BufferedNvmBuilder {
            region,
            controller: (),
            bus: (),
            erase_mode: self.erase_mode,
            _phantom: PhantomData,
        }
    }
}

// Set controller
impl<const PS: usize, const RS: usize> BufferedNvmBuilder<PS, RS, (), (), NeedController> {
    pub fn controller<C: NvmController>(
        self,
        controller: C,
    ) -> BufferedNvmBuilder<PS, RS, C, (), NeedBusArbiter> {
        BufferedNvmBuilder {
            region: self.region,
            controller,
            bus: (),
            erase_mode: self.erase_mode,
            _phantom: PhantomData,
        }
    }
}

// Set bus arbiter
impl<const PS: usize, const RS: usize, C> BufferedNvmBuilder<PS, RS, C, (), NeedBusArbiter>
where
    C: NvmController,
{
    pub fn bus_arbiter<B: BusArbiter>(self, bus: B) -> BufferedNvmBuilder<PS, RS, C, B, Ready> {
        BufferedNvmBuilder {
            region: self.region,
            controller: self.controller,
            bus,
            erase_mode: self.erase_mode,
            _phantom: PhantomData,
        }
    }

    /// Use no bus arbiter (nothing else masters the bus while programming)
    pub fn default_bus(self) -> BufferedNvmBuilder<PS, RS, C, NoBusArbiter, Ready> {
        self.bus_arbiter(NoBusArbiter)
    }
}

// Build the final driver
impl<const PS: usize, const RS: usize, C, B> BufferedNvmBuilder<PS, RS, C, B, Ready>
where
    C: NvmController,
    B: BusArbiter,
{
    /// Choose when dirty pages are erased. Defaults to [`EraseMode::Always`].
    pub fn erase_mode(mut self, mode: EraseMode) -> Self {
        self.erase_mode = mode;
        self
    }

    pub fn build(self) -> BufferedNvm<C, B, PS, RS> {
        BufferedNvm::new(self.controller, self.bus, self.region, self.erase_mode)
    }
}
