use crate::nvm::HardwareFault;

/// A single programming operation, with operands already translated to physical addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Erase the page starting at `addr`.
    ErasePage { addr: u32 },
    /// Program one 32-bit word at `addr`.
    ProgramWord { addr: u32, value: u32 },
    /// Program one row at `addr` from `data`, which holds exactly one row.
    ProgramRow { addr: u32, data: &'a [u8] },
}

impl Command<'_> {
    /// Physical target address of the command.
    pub fn addr(&self) -> u32 {
        match *self {
            Command::ErasePage { addr }
            | Command::ProgramWord { addr, .. }
            | Command::ProgramRow { addr, .. } => addr,
        }
    }
}

/// Register-level access to the flash controller.
///
/// The driver sequences these calls; implementations only poke registers.
/// A programming operation runs as `arm`, `start`, `is_busy` until false, `finish`,
/// all inside a critical section with competing bus masters suspended.
pub trait NvmController {
    /// Reads the current physical contents at virtual address `addr` into `out`.
    fn read(&mut self, addr: u32, out: &mut [u8]);

    /// Translates a virtual address into the physical address the controller expects.
    fn to_physical(&self, addr: u32) -> u32 {
        addr
    }

    /// Latches the command operands and enables writes.
    ///
    /// Controllers that need a settle delay before unlocking perform it here.
    fn arm(&mut self, command: &Command<'_>);

    /// Issues the unlock sequence and starts the armed operation.
    fn start(&mut self);

    /// Returns true while the operation started by [`start`](Self::start) is still running.
    fn is_busy(&mut self) -> bool;

    /// Disables writes and reports the fault flags latched by the last operation.
    fn finish(&mut self) -> Result<(), HardwareFault>;
}
