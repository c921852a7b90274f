//! Test support utilities - only compiled in test builds.

use heapless::Vec;

use crate::nvm::{
    HardwareFault,
    builder::BufferedNvmBuilder,
    bus::BusArbiter,
    controller::{Command, NvmController},
    driver::BufferedNvm,
    types::NvmRegion,
};

/// Virtual base address of the simulated flash (KSEG0 style).
pub const SIM_BASE: u32 = 0x9D00_0000;

const PHYS_MASK: u32 = 0x1FFF_FFFF;

/// Virtual to physical translation used by [`SimController`].
pub const fn phys(addr: u32) -> u32 {
    addr & PHYS_MASK
}

/// Standard test configuration: 64 bytes of flash, 16-byte pages, 8-byte rows.
pub type TestSim = SimController<64, 16>;
pub type TestNvm = BufferedNvm<TestSim, TrackingBus, 16, 8>;

/// A completed programming operation, with physical addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Erase(u32),
    Word(u32, u32),
    Row(u32),
}

/// Simulated flash controller.
///
/// Erased bytes read `0xFF`; programming can only clear bits. Every started operation stays
/// busy for a few polls. Operations can be made to fail with [`SimController::fail_after`].
pub struct SimController<const SIZE: usize, const PS: usize> {
    mem: [u8; SIZE],
    armed: Option<Armed>,
    write_enabled: bool,
    busy_polls: u8,
    fault: Option<HardwareFault>,
    fail_at: Option<(usize, HardwareFault)>,
    started: usize,
    ops: Vec<Op, 256>,
}

#[derive(Clone)]
enum Armed {
    Erase(u32),
    Word(u32, u32),
    Row(u32, Vec<u8, 64>),
}

impl<const SIZE: usize, const PS: usize> SimController<SIZE, PS> {
    pub fn new() -> Self {
        Self {
            mem: [0xFF; SIZE],
            armed: None,
            write_enabled: false,
            busy_polls: 0,
            fault: None,
            fail_at: None,
            started: 0,
            ops: Vec::new(),
        }
    }

    /// Raw physical contents.
    pub fn mem(&self) -> &[u8] {
        &self.mem
    }

    /// Overwrites physical contents directly, bypassing erase/program rules.
    pub fn preload(&mut self, offset: usize, data: &[u8]) {
        self.mem[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Makes the operation started `n` operations from now fail with `fault`.
    pub fn fail_after(&mut self, n: usize, fault: HardwareFault) {
        self.fail_at = Some((self.started + n, fault));
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn erase_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Erase(_))).count()
    }

    pub fn row_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Row(_))).count()
    }

    pub fn word_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Word(..))).count()
    }

    fn index(physical: u32) -> usize {
        (physical - phys(SIM_BASE)) as usize
    }

    fn program(&mut self, physical: u32, data: &[u8]) {
        let at = Self::index(physical);
        for (cell, byte) in self.mem[at..at + data.len()].iter_mut().zip(data) {
            *cell &= *byte;
        }
    }

    fn run(&mut self, armed: Armed) -> Op {
        match armed {
            Armed::Erase(addr) => {
                assert_eq!(Self::index(addr) % PS, 0, "erase of unaligned page");
                let at = Self::index(addr);
                self.mem[at..at + PS].fill(0xFF);
                Op::Erase(addr)
            }
            Armed::Word(addr, value) => {
                assert_eq!(addr % 4, 0, "program of unaligned word");
                self.program(addr, &value.to_le_bytes());
                Op::Word(addr, value)
            }
            Armed::Row(addr, data) => {
                assert_eq!(Self::index(addr) % data.len(), 0, "program of unaligned row");
                self.program(addr, &data);
                Op::Row(addr)
            }
        }
    }
}

impl<const SIZE: usize, const PS: usize> Default for SimController<SIZE, PS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize, const PS: usize> NvmController for SimController<SIZE, PS> {
    fn read(&mut self, addr: u32, out: &mut [u8]) {
        let at = (addr - SIM_BASE) as usize;
        out.copy_from_slice(&self.mem[at..at + out.len()]);
    }

    fn to_physical(&self, addr: u32) -> u32 {
        phys(addr)
    }

    fn arm(&mut self, command: &Command<'_>) {
        assert!(self.armed.is_none(), "command armed twice");
        self.write_enabled = true;
        self.armed = Some(match *command {
            Command::ErasePage { addr } => Armed::Erase(addr),
            Command::ProgramWord { addr, value } => Armed::Word(addr, value),
            Command::ProgramRow { addr, data } => {
                Armed::Row(addr, Vec::from_slice(data).expect("row too large"))
            }
        });
    }

    fn start(&mut self) {
        assert!(self.write_enabled, "start without write enable");
        let armed = self.armed.take().expect("start without armed command");

        let index = self.started;
        self.started += 1;
        self.busy_polls = 2;

        match self.fail_at {
            Some((at, fault)) if at == index => {
                self.fail_at = None;
                self.fault = Some(fault);
            }
            _ => {
                let op = self.run(armed);
                self.ops.push(op).expect("op log full");
            }
        }
    }

    fn is_busy(&mut self) -> bool {
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            true
        } else {
            false
        }
    }

    fn finish(&mut self) -> Result<(), HardwareFault> {
        assert_eq!(self.busy_polls, 0, "finish while busy");
        self.write_enabled = false;
        match self.fault.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

/// Bus arbiter that counts suspend/resume pairs.
#[derive(Debug, Default)]
pub struct TrackingBus {
    pub suspended: usize,
    pub resumed: usize,
}

impl TrackingBus {
    pub fn is_suspended(&self) -> bool {
        self.suspended != self.resumed
    }
}

impl BusArbiter for TrackingBus {
    type Saved = bool;

    fn suspend(&mut self) -> bool {
        self.suspended += 1;
        true
    }

    fn resume(&mut self, saved: bool) {
        assert!(saved);
        self.resumed += 1;
    }
}

/// Helper to create a driver over the standard simulated flash.
pub fn test_nvm() -> TestNvm {
    BufferedNvmBuilder::new()
        .page_size::<16>()
        .row_size::<8>()
        .region(NvmRegion::new(SIM_BASE, 64))
        .controller(TestSim::new())
        .bus_arbiter(TrackingBus::default())
        .build()
}

/// Byte pattern that differs from the erased state everywhere.
pub fn pattern<const N: usize>(seed: u8) -> [u8; N] {
    core::array::from_fn(|i| seed.wrapping_add(i as u8) & 0x7F)
}
