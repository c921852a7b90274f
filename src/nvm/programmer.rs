use crate::nvm::{
    NvmError,
    bus::BusArbiter,
    controller::{Command, NvmController},
    helpers::{WORD_SIZE, is_aligned},
};

/// Runs programming operations against the controller.
///
/// Each operation is atomic with respect to other tasks and interrupts: it executes inside
/// a critical section with competing bus masters suspended, and busy-waits on completion.
pub(crate) struct Programmer<C, B> {
    pub(crate) controller: C,
    pub(crate) bus: B,
}

impl<C, B> Programmer<C, B>
where
    C: NvmController,
    B: BusArbiter,
{
    pub(crate) fn new(controller: C, bus: B) -> Self {
        Self { controller, bus }
    }

    fn execute(&mut self, command: Command<'_>) -> Result<(), NvmError> {
        let controller = &mut self.controller;
        let bus = &mut self.bus;

        let result = critical_section::with(|_| {
            let saved = bus.suspend();

            controller.arm(&command);
            controller.start();
            while controller.is_busy() {
                core::hint::spin_loop();
            }
            let result = controller.finish();

            bus.resume(saved);
            result
        });

        result.map_err(|fault| {
            log::warn!(
                "nvm operation at {:#010x} failed: {}",
                command.addr(),
                fault
            );
            NvmError::from(fault)
        })
    }

    pub(crate) fn erase_page(&mut self, addr: u32) -> Result<(), NvmError> {
        let addr = self.controller.to_physical(addr);
        self.execute(Command::ErasePage { addr })
    }

    pub(crate) fn program_word(&mut self, addr: u32, value: u32) -> Result<(), NvmError> {
        let addr = self.controller.to_physical(addr);
        self.execute(Command::ProgramWord { addr, value })
    }

    pub(crate) fn program_row(&mut self, addr: u32, data: &[u8]) -> Result<(), NvmError> {
        let addr = self.controller.to_physical(addr);
        self.execute(Command::ProgramRow { addr, data })
    }

    /// Writes `src` to `dst` using as few operations as possible.
    ///
    /// Whole rows are programmed wherever the destination is row aligned and at least one
    /// row of data remains; everything else goes out one word at a time. `dst` must be
    /// word aligned and `src.len()` a multiple of the word size.
    pub(crate) fn copy_words<const RS: usize>(
        &mut self,
        dst: u32,
        src: &[u8],
    ) -> Result<(), NvmError> {
        debug_assert!(is_aligned(dst, WORD_SIZE));
        debug_assert!(src.len() % WORD_SIZE == 0);

        let mut offset = 0;
        while offset < src.len() {
            let addr = dst + offset as u32;

            if src.len() - offset >= RS && is_aligned(addr, RS) {
                self.program_row(addr, &src[offset..offset + RS])?;
                offset += RS;
            } else {
                let word = &src[offset..offset + WORD_SIZE];
                let value = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                self.program_word(addr, value)?;
                offset += WORD_SIZE;
            }
        }

        Ok(())
    }
}
