use crate::nvm::{NvmError, helpers::range_end};

/// Physical address range of programmable memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NvmRegion {
    base: u32,
    len: u32,
}

impl NvmRegion {
    pub const fn new(base: u32, len: u32) -> Self {
        Self { base, len }
    }

    #[inline]
    pub const fn base(&self) -> u32 {
        self.base
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `addr` lies inside the region.
    #[inline]
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.base && addr - self.base < self.len
    }

    /// Checks that `len` bytes starting at `addr` lie entirely inside the region.
    pub fn check_range(&self, addr: u32, len: usize) -> Result<(), NvmError> {
        if len == 0 {
            return Err(NvmError::ZeroLength);
        }
        let end = range_end(addr, len).ok_or(NvmError::InvalidAddress)?;
        if !self.contains(addr) || end - self.base > self.len {
            return Err(NvmError::InvalidAddress);
        }
        Ok(())
    }
}

/// Controls whether a dirty page is always erased before it is reprogrammed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseMode {
    /// Erase every dirty page before programming it.
    #[default]
    Always,
    /// Skip the erase when the new contents only clear bits that are currently set.
    WhenRequired,
}

/// Destination of a buffered write.
#[derive(Debug)]
pub enum Dest<'a> {
    /// Byte address inside the NVM region, routed through the page buffer.
    Nvm(u32),
    /// Ordinary memory.
    Ram(&'a mut [u8]),
}

impl<'a> Dest<'a> {
    /// Shortens the lifetime so the destination can be used for one step of a loop.
    #[inline]
    pub fn reborrow(&mut self) -> Dest<'_> {
        match self {
            Dest::Nvm(addr) => Dest::Nvm(*addr),
            Dest::Ram(buf) => Dest::Ram(&mut **buf),
        }
    }

    /// Moves the destination `n` bytes forward.
    ///
    /// # Panics
    /// Panics if a RAM destination is shorter than `n`.
    #[inline]
    pub fn advance(self, n: usize) -> Dest<'a> {
        match self {
            Dest::Nvm(addr) => Dest::Nvm(addr.wrapping_add(n as u32)),
            Dest::Ram(buf) => Dest::Ram(&mut buf[n..]),
        }
    }
}

/// Source of a buffered write.
#[derive(Debug, Clone, Copy)]
pub enum Src<'a> {
    /// Byte address inside the NVM region, read through the page buffer when bound.
    Nvm(u32),
    /// Ordinary memory.
    Ram(&'a [u8]),
    /// A single byte value repeated for the whole length.
    Fill(u8),
}

impl<'a> Src<'a> {
    /// Moves the source `n` bytes forward. A fill source does not move.
    ///
    /// # Panics
    /// Panics if a RAM source is shorter than `n`.
    #[inline]
    pub fn advance(self, n: usize) -> Src<'a> {
        match self {
            Src::Nvm(addr) => Src::Nvm(addr.wrapping_add(n as u32)),
            Src::Ram(buf) => Src::Ram(&buf[n..]),
            Src::Fill(value) => Src::Fill(value),
        }
    }
}
